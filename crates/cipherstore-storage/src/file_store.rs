use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use cipherstore_core::serializer::{Serializer, SerializerError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// What a store does when its file holds data that cannot be decrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionPolicy {
    /// Surface the corruption to the caller.
    #[default]
    Fail,
    /// Replace the file with the serializer's default value and return it.
    Reset,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored file could not be authenticated or decrypted.
    #[error("stored data at {path} is corrupt: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: SerializerError,
    },
    /// The serializer failed for a reason other than corruption.
    #[error("serializer failure: {0}")]
    Serializer(#[source] SerializerError),
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-value store persisted to one file through a `Serializer`.
///
/// A missing file reads as the serializer's default value. Writes go to a
/// temp file in the same directory and are renamed over the target, so
/// readers never observe a half-written payload.
pub struct FileDataStore<S: Serializer> {
    path: PathBuf,
    serializer: S,
    on_corruption: CorruptionPolicy,
    write_lock: Mutex<()>,
}

impl<S: Serializer> FileDataStore<S> {
    pub fn new(path: impl Into<PathBuf>, serializer: S) -> Self {
        Self {
            path: path.into(),
            serializer,
            on_corruption: CorruptionPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.on_corruption = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn read(&self) -> Result<S::Value, StoreError> {
        match self.read_current().await {
            Err(err) if self.should_reset(&err) => {
                let _guard = self.write_lock.lock().await;
                // A writer may have replaced the file while we waited.
                match self.read_current().await {
                    Err(err) if self.should_reset(&err) => self.reset(err).await,
                    other => {
                        debug!(stale = %err, "file changed before reset, keeping it");
                        other
                    }
                }
            }
            other => other,
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn write(&self, value: &S::Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_locked(value).await
    }

    /// Read-modify-write; concurrent writers on this store wait their turn.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn update<F>(&self, transform: F) -> Result<S::Value, StoreError>
    where
        F: FnOnce(S::Value) -> S::Value,
    {
        let _guard = self.write_lock.lock().await;
        let current = match self.read_current().await {
            Err(err) if self.should_reset(&err) => self.reset(err).await?,
            other => other?,
        };

        let next = transform(current);
        self.write_locked(&next).await?;
        Ok(next)
    }

    /// Remove the backing file (idempotent).
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn delete(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_err(err)),
        }
    }

    async fn read_current(&self) -> Result<S::Value, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no stored data, using default");
                return Ok(self.serializer.default_value());
            }
            Err(err) => return Err(self.io_err(err)),
        };

        self.serializer
            .read_from(&mut file)
            .await
            .map_err(|err| self.classify(err))
    }

    async fn write_locked(&self, value: &S::Value) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_err(e))?;
        self.serializer
            .write_to(value, &mut tmp)
            .await
            .map_err(StoreError::Serializer)?;
        tmp.flush().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        debug!("persisted value");
        Ok(())
    }

    async fn reset(&self, cause: StoreError) -> Result<S::Value, StoreError> {
        warn!(error = %cause, "stored data unreadable, resetting to default");
        let default = self.serializer.default_value();
        self.write_locked(&default).await?;
        Ok(default)
    }

    fn should_reset(&self, err: &StoreError) -> bool {
        self.on_corruption == CorruptionPolicy::Reset
            && matches!(err, StoreError::Corrupted { .. })
    }

    fn classify(&self, err: SerializerError) -> StoreError {
        if err.is_corruption() {
            StoreError::Corrupted {
                path: self.path.clone(),
                source: err,
            }
        } else {
            StoreError::Serializer(err)
        }
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
