use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use cipherstore_core::aead::{AeadEngine, AeadError};
use tracing::debug;

use crate::key_provider::{KeyMaterial, KeyProvider};

/// Size of the random nonce prefixed to every frame.
pub const NONCE_LEN: usize = 12;
/// Size of the GCM authentication tag appended by the cipher.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM engine. Frames are `nonce || ciphertext || tag`, with a fresh
/// random nonce per call.
pub struct AesGcmEngine {
    cipher: Aes256Gcm,
    key_id: String,
}

impl AesGcmEngine {
    pub fn new(material: &KeyMaterial) -> Result<Self, AeadError> {
        let cipher =
            Aes256Gcm::new_from_slice(&material.bytes).map_err(|e| AeadError::KeyUnavailable {
                reason: format!("cipher init failed: {e}"),
            })?;
        Ok(Self {
            cipher,
            key_id: material.id.clone(),
        })
    }

    /// Load (or create) the key through `provider` and build an engine from it.
    pub async fn from_provider<P: KeyProvider + ?Sized>(provider: &P) -> Result<Self, AeadError> {
        let material = provider
            .get_or_create()
            .await
            .map_err(|e| AeadError::KeyUnavailable {
                reason: format!("key provider: {e}"),
            })?;
        debug!(key_id = %material.id, "initialized AES-GCM engine");
        Self::new(&material)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl fmt::Debug for AesGcmEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEngine")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl AeadEngine for AesGcmEngine {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|e| AeadError::Encrypt {
                reason: e.to_string(),
            })?;

        let mut frame = Vec::with_capacity(NONCE_LEN + sealed.len());
        frame.extend_from_slice(nonce.as_slice());
        frame.extend_from_slice(&sealed);
        Ok(frame)
    }

    fn decrypt(&self, frame: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        if frame.len() < NONCE_LEN + TAG_LEN {
            return Err(AeadError::Malformed {
                reason: format!(
                    "frame is {} bytes, need at least {}",
                    frame.len(),
                    NONCE_LEN + TAG_LEN
                ),
            });
        }

        let (nonce, sealed) = frame.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: associated_data,
                },
            )
            .map_err(|e| AeadError::Decrypt {
                reason: e.to_string(),
            })
    }
}
