use std::sync::Arc;

use thiserror::Error;

/// Errors produced by authenticated-encryption engines.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AeadError {
    /// Sealing the plaintext failed.
    #[error("encrypt failed: {reason}")]
    Encrypt { reason: String },
    /// Ciphertext did not authenticate (wrong key, tampering, truncation).
    #[error("decrypt failed: {reason}")]
    Decrypt { reason: String },
    /// Input is not a frame this engine could have produced.
    #[error("malformed ciphertext: {reason}")]
    Malformed { reason: String },
    /// Key material could not be obtained or loaded.
    #[error("key unavailable: {reason}")]
    KeyUnavailable { reason: String },
}

/// Authenticated encryption with associated data.
///
/// Implementations own their framing (nonce, tag) so callers treat the output
/// as an opaque byte string.
pub trait AeadEngine: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError>;

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError>;
}

impl<A: AeadEngine + ?Sized> AeadEngine for Arc<A> {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        (**self).encrypt(plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        (**self).decrypt(ciphertext, associated_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MaskingEngine;

    #[test]
    fn shared_engine_forwards_calls() {
        let engine = Arc::new(MaskingEngine::new());
        let shared = Arc::clone(&engine);
        let sealed = shared.encrypt(b"v", &[]).expect("encrypt");
        shared.decrypt(&sealed, &[]).expect("decrypt");
        assert_eq!(engine.encrypt_calls(), 1);
        assert_eq!(engine.decrypt_calls(), 1);
    }
}
