//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Key under which the base64 salt is persisted
pub const MASTER_SALT_KEY: &str = "master_salt";

/// Key under which the base64 verification hash is persisted
pub const MASTER_HASH_KEY: &str = "master_hash";

/// Key-value configuration store holding the vault's persisted state
///
/// Values are plain strings. An empty stored value is reported as absent.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Retrieve a value by key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value by key
    async fn delete(&self, key: &str) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
