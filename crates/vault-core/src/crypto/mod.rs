//! Cryptographic primitives for the credential vault
//!
//! This module provides:
//! - Argon2id key derivation and master password verification
//! - AES-256-GCM authenticated encryption of individual secrets
//! - A zeroize-on-drop key container

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{
    decrypt, decrypt_string, encrypt, encrypt_string, EncryptedBlob, NONCE_LEN, TAG_LEN,
};
pub use key_derivation::{
    derive_key, generate_salt, hash_password, verification_hash, verify_key, verify_password,
    KeyDerivationParams, Salt, SALT_LEN,
};
pub use secure_memory::{DerivedKey, KEY_LEN};
