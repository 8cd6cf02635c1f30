use std::io::{Read, Write};

use async_trait::async_trait;
use tracing::{instrument, trace, warn};

use crate::{
    aead::AeadEngine,
    serializer::{Serializer, SerializerError},
};

/// Associated data is not bound to stored payloads.
const NO_ASSOCIATED_DATA: &[u8] = &[];

/// Serializer that encrypts the bytes produced by an inner serializer and
/// decrypts them again on read.
///
/// A zero-length payload is the "nothing stored yet" marker: it skips
/// decryption and goes straight to the inner serializer, which supplies its
/// default value.
pub struct EncryptedSerializer<S, A> {
    inner: S,
    engine: A,
}

impl<S, A> EncryptedSerializer<S, A>
where
    S: Serializer,
    A: AeadEngine,
{
    pub fn new(inner: S, engine: A) -> Self {
        Self { inner, engine }
    }
}

#[async_trait]
impl<S, A> Serializer for EncryptedSerializer<S, A>
where
    S: Serializer,
    A: AeadEngine,
{
    type Value = S::Value;

    fn default_value(&self) -> S::Value {
        self.inner.default_value()
    }

    #[instrument(skip_all)]
    async fn read_from(
        &self,
        input: &mut (dyn Read + Send),
    ) -> Result<S::Value, SerializerError> {
        let mut stored = Vec::new();
        input.read_to_end(&mut stored)?;

        let plaintext = if stored.is_empty() {
            trace!("empty payload, skipping decryption");
            stored
        } else {
            self.engine
                .decrypt(&stored, NO_ASSOCIATED_DATA)
                .map_err(|source| {
                    warn!(len = stored.len(), error = %source, "decryption failed");
                    SerializerError::Corruption {
                        message: "decryption failed".to_string(),
                        source,
                    }
                })?
        };

        let mut reader = plaintext.as_slice();
        self.inner.read_from(&mut reader).await
    }

    #[instrument(skip_all)]
    async fn write_to(
        &self,
        value: &S::Value,
        output: &mut (dyn Write + Send),
    ) -> Result<(), SerializerError> {
        let mut plaintext = Vec::new();
        self.inner.write_to(value, &mut plaintext).await?;

        let ciphertext = self
            .engine
            .encrypt(&plaintext, NO_ASSOCIATED_DATA)
            .map_err(SerializerError::Encryption)?;
        trace!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "sealed payload"
        );

        output.write_all(&ciphertext)?;
        Ok(())
    }
}

/// Adds `.encrypted(engine)` to every serializer.
pub trait SerializerExt: Serializer + Sized {
    /// Wrap this serializer so its output is sealed with `engine`.
    fn encrypted<A: AeadEngine>(self, engine: A) -> EncryptedSerializer<Self, A> {
        EncryptedSerializer::new(self, engine)
    }
}

impl<S: Serializer> SerializerExt for S {}
