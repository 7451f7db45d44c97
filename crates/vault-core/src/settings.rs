//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the config
//! store. Settings are readable while the vault is locked.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, VaultError};

const SETTINGS_FILE: &str = "settings.json";

/// Default wall-clock bound for a single key derivation
pub const DEFAULT_DERIVE_TIMEOUT_SECS: u64 = 30;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Upper bound for one key derivation in seconds (0 = no limit)
    pub derive_timeout_secs: u64,
    /// Tracing filter directive, e.g. "info" or "mybench_vault=debug"
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            derive_timeout_secs: DEFAULT_DERIVE_TIMEOUT_SECS,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Derivation timeout, `None` when unbounded
    pub fn derive_timeout(&self) -> Option<Duration> {
        match self.derive_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Resolve the default data directory (`~/.config/mybench` on Linux)
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "mybench")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| VaultError::StorageError("Could not determine config directory".to_string()))
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from the given directory, falling back to defaults
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join(SETTINGS_FILE);
        let settings = Self::load_from_file(&settings_file).unwrap_or_default();

        Self {
            settings_file,
            settings,
        }
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.derive_timeout_secs, 30);
        assert_eq!(settings.derive_timeout(), Some(Duration::from_secs(30)));
        assert!(settings.log_filter.is_none());
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let settings = Settings {
            derive_timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.derive_timeout(), None);
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            manager.get_mut().derive_timeout_secs = 90;
            manager.get_mut().log_filter = Some("debug".to_string());
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path());
            assert_eq!(manager.get().derive_timeout_secs, 90);
            assert_eq!(manager.get().log_filter.as_deref(), Some("debug"));
        }
    }

    #[tokio::test]
    async fn test_save_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());
        manager.get_mut().derive_timeout_secs = 5;
        manager.save().await.unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join(SETTINGS_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["deriveTimeoutSecs"], 5);
        assert!(!temp_dir.path().join("settings.tmp").exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            r#"{"logFilter": "info"}"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().log_filter.as_deref(), Some("info"));
        assert_eq!(manager.get().derive_timeout_secs, DEFAULT_DERIVE_TIMEOUT_SECS);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(SETTINGS_FILE), "not json").unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get(), &Settings::default());
    }
}
