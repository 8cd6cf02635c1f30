//! Core abstractions for cipherstore: the serializer and AEAD contracts, and the
//! adapter that encrypts serialized bytes before they reach storage.
//! Concrete ciphers and storage backends live in `cipherstore-storage`.

pub mod aead;
pub mod encrypted;
pub mod json;
pub mod serializer;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
