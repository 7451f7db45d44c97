//! # vault-core
//!
//! Credential vault for MyBench:
//! - Argon2id key derivation from the master password
//! - Master password verification without storing the password
//! - AES-256-GCM encryption of stored connection secrets
//! - Session lifecycle (first-run setup, unlock, lock) over a configuration store

pub mod crypto;
pub mod error;
pub mod profile;
pub mod session;
pub mod settings;
pub mod storage;
mod vault;

pub use crypto::{DerivedKey, EncryptedBlob, KeyDerivationParams, Salt};
pub use error::{Result, VaultError};
pub use profile::{open_secret, ConnectionProfile, SshAuth};
pub use session::{VaultSession, VaultState};
pub use settings::{default_data_dir, Settings, SettingsManager};
pub use storage::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use vault::Vault;
