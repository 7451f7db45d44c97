//! Connection profiles and their secret fields
//!
//! The profile store persists [`ConnectionProfile`] records verbatim. Secret
//! fields are sealed with the vault before a profile is saved and opened after
//! it is loaded, one field at a time.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::vault::Vault;

/// How the SSH tunnel authenticates
///
/// Unrecognised stored values read as [`SshAuth::Key`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SshAuth {
    /// Password (stored encrypted)
    Password,
    /// Private key file
    #[default]
    #[serde(other)]
    Key,
}

/// Saved database connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionProfile {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Database password (secret)
    pub password: String,
    pub default_db: String,
    pub use_ssl: bool,
    pub ssh_enabled: bool,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub ssh_auth: SshAuth,
    pub ssh_key_path: String,
    /// SSH tunnel password (secret)
    pub ssh_password: String,
    pub sort_order: i32,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            host: String::new(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            default_db: String::new(),
            use_ssl: false,
            ssh_enabled: false,
            ssh_host: String::new(),
            ssh_port: 22,
            ssh_user: String::new(),
            ssh_auth: SshAuth::Key,
            ssh_key_path: String::new(),
            ssh_password: String::new(),
            sort_order: 0,
        }
    }
}

impl ConnectionProfile {
    /// Copy of this profile with its secret fields encrypted, ready to persist
    ///
    /// Fails rather than ever persisting a secret in the clear.
    pub fn seal(&self, vault: &Vault) -> Result<Self> {
        Ok(Self {
            password: vault.encrypt(&self.password)?,
            ssh_password: vault.encrypt(&self.ssh_password)?,
            ..self.clone()
        })
    }

    /// Copy of a loaded profile with its secret fields decrypted
    ///
    /// A field that does not decrypt keeps its stored value (legacy plaintext
    /// or data from another key); the rest of the profile still loads.
    pub fn open(&self, vault: &Vault) -> Self {
        Self {
            password: open_secret(vault, "password", &self.password),
            ssh_password: open_secret(vault, "sshPassword", &self.ssh_password),
            ..self.clone()
        }
    }
}

/// Decrypt one stored secret, falling back to the stored value on failure
pub fn open_secret(vault: &Vault, field: &str, stored: &str) -> String {
    match vault.decrypt(stored) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            warn!("Could not decrypt {} field, keeping stored value: {}", field, e);
            stored.to_string()
        }
    }
}
