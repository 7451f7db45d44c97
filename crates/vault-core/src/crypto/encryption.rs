//! AES-256-GCM authenticated encryption
//!
//! Stored format: `base64(nonce || ciphertext || auth_tag)`
//! - Nonce: 12 bytes (96 bits), freshly drawn from the OS random source per call
//! - Ciphertext: same length as the plaintext
//! - Auth tag: 16 bytes (128 bits), appended by GCM
//!
//! No additional authenticated data is used.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use super::DerivedKey;
use crate::error::{Result, VaultError};

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// A single encrypted secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Nonce used for this encryption (never reused under one key)
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the auth tag appended
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Raw layout: `nonce || ciphertext || tag`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Split raw bytes into nonce and ciphertext
    ///
    /// Only the nonce length is checked here; a ciphertext too short to hold a
    /// tag fails authentication in [`decrypt`] like any other bad input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_LEN {
            return Err(VaultError::MalformedBlob(format!(
                "expected at least {} bytes, got {}",
                NONCE_LEN,
                bytes.len()
            )));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Parse the base64 form kept in profile records
    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| VaultError::MalformedBlob(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&STANDARD.encode(self.to_bytes()))
    }
}

impl std::str::FromStr for EncryptedBlob {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Encrypt plaintext using AES-256-GCM under a fresh random nonce
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<EncryptedBlob> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| VaultError::RandomSourceFailure(e.to_string()))?;

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    Ok(EncryptedBlob { nonce, ciphertext })
}

/// Decrypt and authenticate a blob using AES-256-GCM
pub fn decrypt(blob: &EncryptedBlob, key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(&blob.nonce), blob.ciphertext.as_slice())
        .map_err(|_| VaultError::DecryptionFailed)
}

/// Encrypt a string and return the stored form
///
/// The empty string maps to the empty string without touching the cipher.
pub fn encrypt_string(plaintext: &str, key: &DerivedKey) -> Result<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }
    let blob = encrypt(plaintext.as_bytes(), key)?;
    Ok(blob.to_string())
}

/// Decrypt the stored form back into a string
///
/// The empty string maps to the empty string without touching the cipher.
pub fn decrypt_string(encoded: &str, key: &DerivedKey) -> Result<String> {
    if encoded.is_empty() {
        return Ok(String::new());
    }
    let blob = EncryptedBlob::parse(encoded)?;
    let plaintext = decrypt(&blob, key)?;
    String::from_utf8(plaintext).map_err(|_| VaultError::DecryptionFailed)
}
