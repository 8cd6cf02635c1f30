//! Test doubles for code built on cipherstore serializers.
//! Compiled only for this crate's tests or with the `test-support` feature.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::aead::{AeadEngine, AeadError};

/// Engine that simulates encryption for tests and smoke runs, counting calls.
/// This is not cryptographically secure; production code must use a real AEAD
/// such as `cipherstore_storage::aes_gcm_engine::AesGcmEngine`.
#[derive(Debug, Default)]
pub struct MaskingEngine {
    encrypt_calls: AtomicUsize,
    decrypt_calls: AtomicUsize,
}

const MASK_BYTE: u8 = 0xA5;
const FRAME_MARKER: u8 = 0xC5;

impl MaskingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

impl AeadEngine for MaskingEngine {
    fn encrypt(&self, plaintext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        let mut framed = Vec::with_capacity(plaintext.len() + 1);
        framed.push(FRAME_MARKER);
        framed.extend(plaintext.iter().map(|b| b ^ MASK_BYTE));
        Ok(framed)
    }

    fn decrypt(&self, ciphertext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        match ciphertext.split_first() {
            Some((&FRAME_MARKER, body)) => Ok(body.iter().map(|b| b ^ MASK_BYTE).collect()),
            _ => Err(AeadError::Malformed {
                reason: "missing frame marker".to_string(),
            }),
        }
    }
}
