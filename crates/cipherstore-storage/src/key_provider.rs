use std::{
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Key material used for encryption at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Identifier for logging/rotation (never log key bytes).
    pub id: String,
    /// 256-bit symmetric key.
    pub bytes: [u8; KEY_LEN],
}

impl KeyMaterial {
    pub fn new(id: impl Into<String>, bytes: [u8; KEY_LEN]) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }

    /// Fresh random key from the OS generator.
    pub fn generate(id: impl Into<String>) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self::new(id, bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("id", &self.id)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Provides access to encryption keys (OS keychain in production; memory in tests).
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError>;
}

/// OS keyring-backed provider. The key is created on first use and stored
/// base64-encoded under `service`/`account`.
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for KeyringProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        // Keyring operations are synchronous; wrap in async for trait compatibility.
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| KeyError::Keyring(e.to_string()))?;

        match entry.get_password() {
            Ok(secret) => decode_key(&self.account, &secret),
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, account = %self.account, "creating data key");
                let material = KeyMaterial::generate(self.account.clone());
                entry
                    .set_password(&encode_key(&material))
                    .map_err(|e| KeyError::Keyring(e.to_string()))?;
                Ok(material)
            }
            Err(err) => Err(KeyError::Keyring(err.to_string())),
        }
    }
}

/// In-memory key provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

#[async_trait]
impl KeyProvider for InMemoryKeyProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let material = KeyMaterial::generate("memory");
        *guard = Some(material.clone());
        Ok(material)
    }
}

/// Provider that always hands out the same caller-supplied key.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    material: KeyMaterial,
}

impl StaticKeyProvider {
    pub fn new(material: KeyMaterial) -> Self {
        Self { material }
    }

    /// Build from a base64-encoded 256-bit key.
    pub fn from_base64(id: &str, secret: &str) -> Result<Self, KeyError> {
        decode_key(id, secret).map(Self::new)
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        Ok(self.material.clone())
    }
}

fn encode_key(material: &KeyMaterial) -> String {
    general_purpose::STANDARD.encode(material.bytes)
}

fn decode_key(id: &str, secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret.trim())
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|raw: Vec<u8>| {
        KeyError::Decode(format!("expected {KEY_LEN} bytes, got {}", raw.len()))
    })?;
    Ok(KeyMaterial::new(id, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_provider_returns_same_key() {
        let provider = InMemoryKeyProvider::default();
        let first = provider.get_or_create().await.unwrap();
        let second = provider.get_or_create().await.unwrap();

        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn separate_memory_providers_use_different_keys() {
        let a = InMemoryKeyProvider::default().get_or_create().await.unwrap();
        let b = InMemoryKeyProvider::default().get_or_create().await.unwrap();
        assert_ne!(a.bytes, b.bytes);
    }

    #[tokio::test]
    async fn static_provider_decodes_base64_key() {
        let material = KeyMaterial::generate("fixed");
        let provider = StaticKeyProvider::from_base64("fixed", &encode_key(&material))
            .expect("valid key");
        assert_eq!(provider.get_or_create().await.unwrap(), material);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_key("default", "abcd").expect_err("should reject wrong length");
        assert!(matches!(err, KeyError::Decode(_)));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode_key("default", "not base64!").expect_err("should reject");
        assert!(matches!(err, KeyError::Decode(_)));
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let material = KeyMaterial::new("k1", [7u8; KEY_LEN]);
        let rendered = format!("{material:?}");
        assert!(rendered.contains("k1"));
        assert!(!rendered.contains("7, 7"));
    }
}
