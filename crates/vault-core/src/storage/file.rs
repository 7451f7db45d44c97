//! JSON file configuration store
//!
//! Keeps every entry in `config.json` inside the application data directory.
//! Values are stored as given: the vault only ever writes the base64 salt and
//! verification hash here, never key material or plaintext secrets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use super::ConfigStore;
use crate::error::Result;

const CONFIG_FILE: &str = "config.json";
const FILE_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    version: u32,
    entries: HashMap<String, String>,
}

/// JSON file configuration store
pub struct FileConfigStore {
    /// Directory holding the config file
    storage_dir: PathBuf,
    /// In-memory copy of the file contents
    entries: RwLock<HashMap<String, String>>,
}

impl FileConfigStore {
    /// Open (or create) the store in the given directory
    pub async fn open(storage_dir: PathBuf) -> Result<Self> {
        ensure_private_dir(&storage_dir).await?;

        let store = Self {
            storage_dir,
            entries: RwLock::new(HashMap::new()),
        };
        store.load().await?;

        debug!("Config store opened at: {:?}", store.storage_dir);
        Ok(store)
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn config_file_path(&self) -> PathBuf {
        self.storage_dir.join(CONFIG_FILE)
    }

    async fn load(&self) -> Result<()> {
        let path = self.config_file_path();

        if !path.exists() {
            debug!("No existing config file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: ConfigFile = serde_json::from_str(&contents)?;

        let mut entries = self.entries.write().await;
        *entries = file.entries;

        debug!("Loaded {} config entries", entries.len());
        Ok(())
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        let file = ConfigFile {
            version: FILE_VERSION,
            entries: entries.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.config_file_path();

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} config entries", entries.len());
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|v| !v.is_empty()).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Hold the write lock across the save so the file never lags the cache
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await?;

        debug!("Stored config key: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;

        if entries.remove(key).is_some() {
            self.save(&entries).await?;
            debug!("Deleted config key: {}", key);
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File"
    }
}

/// Create the directory if missing, readable by the owner only
///
/// An existing directory is used as is.
async fn ensure_private_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await? {
        return Ok(());
    }

    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await?;

    debug!("Created data directory: {:?}", dir);
    Ok(())
}
