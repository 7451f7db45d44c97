//! Vault session: first-run setup, unlock and lock
//!
//! A `VaultSession` is an explicit object handed to whatever needs
//! encrypt/decrypt capability. It owns no persistent state itself: the salt and
//! verification hash live in a [`ConfigStore`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{
    derive_key, verification_hash, verify_key, DerivedKey, KeyDerivationParams, Salt,
};
use crate::error::{Result, VaultError};
use crate::storage::{ConfigStore, MASTER_HASH_KEY, MASTER_SALT_KEY};
use crate::vault::Vault;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No key in memory
    Locked,
    /// Key derived and verified; encrypt/decrypt available
    Unlocked,
}

/// Orchestrates the master password lifecycle over a configuration store
pub struct VaultSession {
    /// Where the salt and verification hash are persisted
    store: Arc<dyn ConfigStore>,
    /// Argon2id parameters shared by hashing and verification
    params: KeyDerivationParams,
    /// Optional wall-clock bound for one derivation
    derive_timeout: Option<Duration>,
    /// The unlocked vault, if any
    vault: Option<Arc<Vault>>,
}

impl VaultSession {
    /// Create a locked session over the given store
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            params: KeyDerivationParams::default(),
            derive_timeout: None,
            vault: None,
        }
    }

    /// Override the key derivation parameters
    ///
    /// Every session over the same store must use the same parameters.
    pub fn with_params(mut self, params: KeyDerivationParams) -> Self {
        self.params = params;
        self
    }

    /// Bound how long a single derivation may take
    pub fn with_derive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.derive_timeout = timeout;
        self
    }

    /// Get the current session state
    pub fn state(&self) -> VaultState {
        if self.vault.is_some() {
            VaultState::Unlocked
        } else {
            VaultState::Locked
        }
    }

    /// Check if the session is unlocked
    pub fn is_unlocked(&self) -> bool {
        self.state() == VaultState::Unlocked
    }

    /// Whether a master password has been set for this installation
    pub async fn has_master_password(&self) -> Result<bool> {
        Ok(self.store.get(MASTER_HASH_KEY).await?.is_some())
    }

    /// Set the master password on first run and unlock
    ///
    /// Rejected with [`VaultError::AlreadyInitialized`] once a verification hash
    /// exists: replacing the salt would orphan every stored secret.
    pub async fn set_master_password(&mut self, password: &str) -> Result<()> {
        if self.has_master_password().await? {
            return Err(VaultError::AlreadyInitialized);
        }

        info!("Setting master password");

        let salt = Salt::generate()?;
        let key = self.derive(password, salt).await?;

        // Salt first: a crash in between leaves no hash, so setup can be redone
        self.store.set(MASTER_SALT_KEY, &salt.to_base64()).await?;
        self.store
            .set(MASTER_HASH_KEY, &verification_hash(&key))
            .await?;

        self.vault = Some(Arc::new(Vault::from_key(key)));

        info!("Master password set, vault unlocked");
        Ok(())
    }

    /// Verify the master password and unlock
    ///
    /// Returns `Ok(false)` for a wrong password and leaves the state untouched.
    /// Unlocking an unlocked session replaces its key on success.
    pub async fn unlock(&mut self, password: &str) -> Result<bool> {
        let salt_b64 = self
            .store
            .get(MASTER_SALT_KEY)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        let stored_hash = self
            .store
            .get(MASTER_HASH_KEY)
            .await?
            .ok_or(VaultError::NotInitialized)?;

        let salt = Salt::from_base64(&salt_b64).ok_or_else(|| VaultError::InvalidConfig {
            key: MASTER_SALT_KEY.to_string(),
            reason: "expected base64 of 16 bytes".to_string(),
        })?;

        let key = self.derive(password, salt).await?;

        if !verify_key(&key, &stored_hash) {
            info!("Unlock rejected: wrong master password");
            return Ok(false);
        }

        self.vault = Some(Arc::new(Vault::from_key(key)));

        info!("Vault unlocked");
        Ok(true)
    }

    /// Drop this session's key and return to `Locked`
    ///
    /// Handles previously obtained from [`vault`](Self::vault) keep working
    /// until they are dropped; the key is zeroized with the last one.
    pub fn lock(&mut self) {
        if self.vault.take().is_some() {
            info!("Vault locked");
        }
    }

    /// Shared handle to the unlocked vault
    pub fn vault(&self) -> Result<Arc<Vault>> {
        self.vault.clone().ok_or(VaultError::VaultLocked)
    }

    /// Run the derivation on the blocking pool, honouring the timeout
    async fn derive(&self, password: &str, salt: Salt) -> Result<DerivedKey> {
        let password = Zeroizing::new(password.to_owned());
        let params = self.params;

        debug!("Deriving key on blocking pool");
        let task = tokio::task::spawn_blocking(move || derive_key(&password, &salt, &params));

        let joined = match self.derive_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| VaultError::DerivationTimeout(limit))?,
            None => task.await,
        };

        joined
            .map_err(|e| VaultError::KeyDerivationError(format!("derivation task failed: {}", e)))?
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("backend", &self.store.backend_name())
            .field("state", &self.state())
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileConfigStore, MemoryConfigStore};
    use async_trait::async_trait;
    use tempfile::TempDir;

    const FAST: KeyDerivationParams = KeyDerivationParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    };

    fn test_session() -> (VaultSession, Arc<MemoryConfigStore>) {
        let store = Arc::new(MemoryConfigStore::new());
        let session = VaultSession::new(store.clone()).with_params(FAST);
        (session, store)
    }

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl ConfigStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(VaultError::StorageError("database is locked".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(VaultError::StorageError("database is locked".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(VaultError::StorageError("database is locked".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "Broken"
        }
    }

    #[tokio::test]
    async fn test_set_master_password_and_unlock() {
        let (mut session, store) = test_session();

        assert_eq!(session.state(), VaultState::Locked);
        assert!(!session.has_master_password().await.unwrap());

        session.set_master_password("test-password").await.unwrap();
        assert_eq!(session.state(), VaultState::Unlocked);
        assert!(session.has_master_password().await.unwrap());

        // salt and hash are persisted as base64
        let salt = store.get(MASTER_SALT_KEY).await.unwrap().unwrap();
        assert!(Salt::from_base64(&salt).is_some());
        assert!(store.get(MASTER_HASH_KEY).await.unwrap().is_some());

        session.lock();
        assert_eq!(session.state(), VaultState::Locked);

        assert!(session.unlock("test-password").await.unwrap());
        assert_eq!(session.state(), VaultState::Unlocked);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (mut session, _store) = test_session();

        session.set_master_password("correct-password").await.unwrap();
        session.lock();

        assert!(!session.unlock("wrong-password").await.unwrap());
        assert_eq!(session.state(), VaultState::Locked);
        assert!(matches!(session.vault(), Err(VaultError::VaultLocked)));
    }

    #[tokio::test]
    async fn test_set_master_password_only_once() {
        let (mut session, _store) = test_session();

        session.set_master_password("first").await.unwrap();
        let result = session.set_master_password("second").await;

        assert!(matches!(result, Err(VaultError::AlreadyInitialized)));

        session.lock();
        assert!(session.unlock("first").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlock_before_setup() {
        let (mut session, _store) = test_session();

        let result = session.unlock("anything").await;
        assert!(matches!(result, Err(VaultError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_unlock_with_corrupt_salt() {
        let (mut session, store) = test_session();
        store.set(MASTER_SALT_KEY, "###").await.unwrap();
        store.set(MASTER_HASH_KEY, "AAAA").await.unwrap();

        let result = session.unlock("pw").await;
        assert!(matches!(result, Err(VaultError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_unlock_with_corrupt_hash_is_mismatch() {
        let (mut session, store) = test_session();
        session.set_master_password("pw").await.unwrap();
        session.lock();

        store.set(MASTER_HASH_KEY, "not base64 at all!").await.unwrap();

        assert!(!session.unlock("pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut session = VaultSession::new(Arc::new(BrokenStore)).with_params(FAST);

        assert!(matches!(
            session.has_master_password().await,
            Err(VaultError::StorageError(_))
        ));
        assert!(matches!(
            session.set_master_password("pw").await,
            Err(VaultError::StorageError(_))
        ));
        assert!(matches!(
            session.unlock("pw").await,
            Err(VaultError::StorageError(_))
        ));
        assert!(!session.is_unlocked());
    }

    #[tokio::test]
    async fn test_secrets_survive_relock() {
        let (mut session, _store) = test_session();
        session.set_master_password("pw").await.unwrap();

        let blob = session.vault().unwrap().encrypt("db-secret-123").unwrap();

        session.lock();
        assert!(session.unlock("pw").await.unwrap());

        assert_eq!(session.vault().unwrap().decrypt(&blob).unwrap(), "db-secret-123");
    }

    #[tokio::test]
    async fn test_failed_reunlock_keeps_current_key() {
        let (mut session, _store) = test_session();
        session.set_master_password("pw").await.unwrap();

        assert!(!session.unlock("nope").await.unwrap());
        assert!(session.is_unlocked());
    }

    #[tokio::test]
    async fn test_sessions_share_file_store() {
        let temp_dir = TempDir::new().unwrap();

        let blob = {
            let store = Arc::new(
                FileConfigStore::open(temp_dir.path().to_path_buf())
                    .await
                    .unwrap(),
            );
            let mut session = VaultSession::new(store).with_params(FAST);
            session.set_master_password("launch-one").await.unwrap();
            session.vault().unwrap().encrypt("ssh-pass").unwrap()
        };

        let store = Arc::new(
            FileConfigStore::open(temp_dir.path().to_path_buf())
                .await
                .unwrap(),
        );
        let mut session = VaultSession::new(store).with_params(FAST);

        assert!(session.has_master_password().await.unwrap());
        assert!(!session.unlock("launch-two").await.unwrap());
        assert!(session.unlock("launch-one").await.unwrap());
        assert_eq!(session.vault().unwrap().decrypt(&blob).unwrap(), "ssh-pass");
    }

    #[tokio::test]
    async fn test_derivation_timeout() {
        let (session, _store) = test_session();
        let mut session = session
            .with_params(KeyDerivationParams::default())
            .with_derive_timeout(Some(Duration::from_millis(1)));

        let result = session.set_master_password("pw").await;

        assert!(matches!(result, Err(VaultError::DerivationTimeout(_))));
        assert!(!session.has_master_password().await.unwrap());
        assert!(!session.is_unlocked());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let (session, _store) = test_session();
        let debug = format!("{:?}", session);
        assert!(debug.contains("Locked"));
        assert!(debug.contains("In-Memory"));
    }
}
