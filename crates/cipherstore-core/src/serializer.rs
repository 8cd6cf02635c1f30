use std::io::{Read, Write};

use async_trait::async_trait;
use thiserror::Error;

use crate::aead::AeadError;

/// Errors produced while converting values to and from stored bytes.
#[derive(Debug, Error)]
pub enum SerializerError {
    /// Stored bytes could not be authenticated or decrypted; the data is unusable.
    #[error("stored data is corrupt: {message}")]
    Corruption {
        message: String,
        #[source]
        source: AeadError,
    },
    /// The codec rejected a value or a plaintext payload.
    #[error("codec failure: {reason}")]
    Codec { reason: String },
    /// The encryption engine failed while sealing a payload.
    #[error("encryption failure: {0}")]
    Encryption(#[source] AeadError),
    /// Reading from or writing to the byte stream failed.
    #[error("stream i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl SerializerError {
    pub fn codec(reason: impl ToString) -> Self {
        SerializerError::Codec {
            reason: reason.to_string(),
        }
    }

    /// True when the stored bytes themselves are untrusted, as opposed to a
    /// codec, engine, or transient I/O failure.
    pub fn is_corruption(&self) -> bool {
        matches!(self, SerializerError::Corruption { .. })
    }
}

/// Converts a value to and from the byte stream kept in storage.
///
/// Storage layers call `read_from` with the full contents of a stored file and
/// fall back to `default_value` when nothing has been stored yet.
#[async_trait]
pub trait Serializer: Send + Sync {
    type Value: Send + Sync;

    /// Value used when storage holds no data.
    fn default_value(&self) -> Self::Value;

    /// Decode a value from the stream.
    async fn read_from(&self, input: &mut (dyn Read + Send)) -> Result<Self::Value, SerializerError>;

    /// Encode a value into the stream.
    async fn write_to(
        &self,
        value: &Self::Value,
        output: &mut (dyn Write + Send),
    ) -> Result<(), SerializerError>;
}
