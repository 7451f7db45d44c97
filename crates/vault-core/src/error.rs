//! Error types for vault-core

use std::time::Duration;

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// A wrong master password is not an error: [`crate::VaultSession::unlock`]
/// reports it as `Ok(false)`.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Vault is locked - unlock with the master password first")]
    VaultLocked,

    #[error("No master password has been set")]
    NotInitialized,

    #[error("A master password has already been set")]
    AlreadyInitialized,

    #[error("Secure random source unavailable: {0}")]
    RandomSourceFailure(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Key derivation did not finish within {0:?}")]
    DerivationTimeout(Duration),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Malformed encrypted value: {0}")]
    MalformedBlob(String),

    // Deliberately carries no detail: wrong key, corruption and tampering
    // must be indistinguishable.
    #[error("Decryption failed: wrong master password or corrupted data")]
    DecryptionFailed,

    #[error("Invalid stored {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VaultError {
    /// True when a stored value could not be turned back into plaintext.
    ///
    /// Callers loading profiles use this to fall back to the raw stored value
    /// instead of failing the whole load.
    pub fn is_decrypt_failure(&self) -> bool {
        matches!(self, Self::MalformedBlob(_) | Self::DecryptionFailed)
    }
}
