use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::config::Config;
use cipherstore_core::{
    encrypted::{EncryptedSerializer, SerializerExt},
    json::JsonSerializer,
};
use cipherstore_storage::{
    aes_gcm_engine::AesGcmEngine,
    file_store::{CorruptionPolicy, FileDataStore},
    key_provider::{KeyProvider, KeyringProvider, StaticKeyProvider},
};
use color_eyre::Result;
use dirs::data_dir;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Key/value preferences persisted by the CLI.
pub type Preferences = BTreeMap<String, String>;

/// Encrypted single-file store for a JSON-encoded value.
pub type EncryptedStore<T> = FileDataStore<EncryptedSerializer<JsonSerializer<T>, AesGcmEngine>>;

const PREFERENCES_FILE: &str = "preferences.enc";
const HEALTH_PROBE_FILE: &str = "health.probe";
const DATA_KEY_ENV: &str = "CIPHERSTORE_DATA_KEY";

/// Resolve the default data directory for cipherstore.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("cipherstore"))
}

/// Data directory after applying config overrides.
pub fn data_root(config: &Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(root) => Ok(root.clone()),
        None => default_data_dir(),
    }
}

/// Key provider for this run: an explicit base64 key from `CIPHERSTORE_DATA_KEY`
/// or `data_key` in config, otherwise the OS keychain.
pub fn key_provider(config: &Config) -> Result<Box<dyn KeyProvider>> {
    resolve_key_provider(config, std::env::var(DATA_KEY_ENV).ok())
}

fn resolve_key_provider(
    config: &Config,
    env_key: Option<String>,
) -> Result<Box<dyn KeyProvider>> {
    if let Some(secret) = env_key.or_else(|| config.data_key.clone()) {
        debug!("using explicitly configured data key");
        return Ok(Box::new(StaticKeyProvider::from_base64(
            "configured",
            &secret,
        )?));
    }

    let keyring = config.keyring();
    Ok(Box::new(KeyringProvider::new(
        keyring.service,
        keyring.account,
    )))
}

/// Build the preference store rooted at `root`, keyed through `provider`.
pub async fn preference_store<P: KeyProvider + ?Sized>(
    root: &Path,
    provider: &P,
    policy: CorruptionPolicy,
) -> Result<EncryptedStore<Preferences>> {
    encrypted_store(root.join(PREFERENCES_FILE), provider, policy).await
}

/// Build the store used by the health probe.
pub async fn probe_store<P: KeyProvider + ?Sized>(
    root: &Path,
    provider: &P,
) -> Result<EncryptedStore<String>> {
    encrypted_store(
        root.join(HEALTH_PROBE_FILE),
        provider,
        CorruptionPolicy::Fail,
    )
    .await
}

/// Build the preference store from config.
pub async fn store_from_config(config: &Config) -> Result<EncryptedStore<Preferences>> {
    let root = data_root(config)?;
    debug!(?root, "initializing encrypted store");
    let provider = key_provider(config)?;
    preference_store(&root, provider.as_ref(), config.corruption_policy()).await
}

async fn encrypted_store<T, P>(
    path: PathBuf,
    provider: &P,
    policy: CorruptionPolicy,
) -> Result<EncryptedStore<T>>
where
    T: Serialize + DeserializeOwned + Clone + Default + Send + Sync,
    P: KeyProvider + ?Sized,
{
    let engine = AesGcmEngine::from_provider(provider).await?;
    let serializer = JsonSerializer::<T>::default().encrypted(engine);
    Ok(FileDataStore::new(path, serializer).with_corruption_policy(policy))
}
