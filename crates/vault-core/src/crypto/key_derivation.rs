//! Password-based key derivation and master password verification using Argon2id
//!
//! The verification hash written at first run is the base64 encoding of the very
//! same Argon2id output that is used as the encryption key. Anyone holding the
//! stored hash therefore holds the key. Existing installations depend on this
//! layout, so it must not change without a migration of every stored secret.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use super::secure_memory::{DerivedKey, KEY_LEN};
use crate::error::{Result, VaultError};

/// Length of the per-installation salt in bytes
pub const SALT_LEN: usize = 16;

/// Parameters for Argon2id key derivation
///
/// Changing any of these values changes every derived key, which invalidates
/// the stored verification hash and every encrypted secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 1)
    pub time_cost: u32,
    /// Parallelism in lanes (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 64 * 1024,
            time_cost: 1,
            parallelism: 4,
        }
    }
}

/// Random per-installation salt mixed into every derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the operating system's secure random source
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| VaultError::RandomSourceFailure(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// Encode for the configuration store
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a stored salt; `None` unless it is valid base64 of exactly 16 bytes
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let bytes = STANDARD.decode(encoded.trim()).ok()?;
        let bytes: [u8; SALT_LEN] = bytes.as_slice().try_into().ok()?;
        Some(Self(bytes))
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> Result<Salt> {
    Salt::generate()
}

/// Derive a 256-bit key from a password using Argon2id
///
/// Deterministic for a given password, salt and parameter set. Empty passwords
/// are accepted; whether they are allowed is the caller's decision.
///
/// This is deliberately expensive; call it off any latency-sensitive thread.
pub fn derive_key(password: &str, salt: &Salt, params: &KeyDerivationParams) -> Result<DerivedKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::KeyDerivationError(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = DerivedKey::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), key.as_bytes_mut())
        .map_err(|e| VaultError::KeyDerivationError(e.to_string()))?;

    Ok(key)
}

/// Compute the verification hash stored at first run (base64 of the derived key)
pub fn hash_password(password: &str, salt: &Salt, params: &KeyDerivationParams) -> Result<String> {
    let key = derive_key(password, salt, params)?;
    Ok(verification_hash(&key))
}

/// Verification hash for an already-derived key
pub fn verification_hash(key: &DerivedKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Check an already-derived key against the stored verification hash
///
/// A stored hash that does not decode simply does not match.
pub fn verify_key(key: &DerivedKey, stored_hash: &str) -> bool {
    match STANDARD.decode(stored_hash.trim()) {
        Ok(decoded) => constant_time_eq(key.as_bytes(), &decoded),
        Err(_) => false,
    }
}

/// Check a candidate password against the stored verification hash
pub fn verify_password(
    password: &str,
    salt: &Salt,
    stored_hash: &str,
    params: &KeyDerivationParams,
) -> Result<bool> {
    let key = derive_key(password, salt, params)?;
    Ok(verify_key(&key, stored_hash))
}

/// Constant-time comparison; only the length is allowed to leak.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
