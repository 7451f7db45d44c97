//! The unlocked vault: a derived key plus the operations that use it

use crate::crypto::{
    decrypt_string, derive_key, encrypt_string, DerivedKey, KeyDerivationParams, Salt,
};
use crate::error::Result;

/// Holds the session key and encrypts/decrypts individual secrets
///
/// The key never changes once the vault exists, so a vault can be shared as
/// `Arc<Vault>` and used from many tasks at once without locking. The key is
/// zeroized when the vault is dropped.
#[derive(Debug)]
pub struct Vault {
    key: DerivedKey,
}

impl Vault {
    /// Derive the key from the master password (blocking, CPU and memory heavy)
    pub fn derive(password: &str, salt: &Salt, params: &KeyDerivationParams) -> Result<Self> {
        let key = derive_key(password, salt, params)?;
        Ok(Self::from_key(key))
    }

    /// Wrap an already-derived key
    pub fn from_key(key: DerivedKey) -> Self {
        Self { key }
    }

    /// Encrypt a secret for storage; `""` stays `""`
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        encrypt_string(plaintext, &self.key)
    }

    /// Decrypt a stored secret; `""` stays `""`
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        decrypt_string(encoded, &self.key)
    }
}
