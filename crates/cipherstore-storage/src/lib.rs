//! Concrete collaborators for cipherstore serializers: AES-GCM encryption with
//! keys sourced from the OS keyring (or test doubles), and a file-backed store.

pub mod aes_gcm_engine;
pub mod file_store;
pub mod key_provider;
