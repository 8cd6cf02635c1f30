use std::{
    fs,
    path::{Path, PathBuf},
};

use cipherstore_storage::file_store::CorruptionPolicy;
use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/cipherstore/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for data directory (encrypted files).
    pub data_dir: Option<PathBuf>,
    /// Where the data key lives in the OS keychain.
    pub keyring: Option<KeyringConfig>,
    /// Base64 256-bit data key; skips the keychain (headless machines, CI).
    pub data_key: Option<String>,
    /// Behaviour when a stored file cannot be decrypted.
    pub on_corruption: Option<CorruptionPolicy>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyringConfig {
    pub service: String,
    pub account: String,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            service: "cipherstore".to_string(),
            account: "data-key".to_string(),
        }
    }
}

impl Config {
    pub fn keyring(&self) -> KeyringConfig {
        self.keyring.clone().unwrap_or_default()
    }

    pub fn corruption_policy(&self) -> CorruptionPolicy {
        self.on_corruption.unwrap_or_default()
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("cipherstore").join("config.toml"))
}

/// Write the given config to disk unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
