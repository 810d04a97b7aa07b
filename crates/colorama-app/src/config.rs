//! Application configuration.

use colorama_core::config::DrawingMode;
use colorama_core::history::DEFAULT_HISTORY_CAPACITY;
use colorama_core::storage::{
    DEFAULT_AUTOSAVE_INTERVAL_SECS, FileStorage, StorageResult, create_default_storage,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shell settings, read from `config.json` in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Mode new sessions start in.
    pub mode: DrawingMode,
    pub history_capacity: usize,
    pub autosave_enabled: bool,
    pub autosave_interval_secs: u64,
    /// Project directory; the platform data directory when unset.
    pub storage_dir: Option<PathBuf>,
    /// Whether the host delivers unified pointer events.
    pub pointer_available: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Colorama".to_string(),
            width: 512,
            height: 512,
            mode: DrawingMode::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            autosave_enabled: true,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            storage_dir: None,
            pointer_available: false,
        }
    }
}

impl AppConfig {
    /// `~/.config/colorama/config.json` on Linux, and the equivalent
    /// elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("colorama").join("config.json"))
    }

    /// Read a config file. A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::debug!("No config at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read the config from [`default_path`](Self::default_path).
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Self::default(),
        }
    }

    /// Project storage for this configuration.
    pub fn storage(&self) -> StorageResult<Arc<FileStorage>> {
        match &self.storage_dir {
            Some(dir) => Ok(Arc::new(FileStorage::new(dir.clone())?)),
            None => create_default_storage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (512, 512));
        assert_eq!(config.mode, DrawingMode::Pixel);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.autosave_interval_secs, 30);
        assert!(config.autosave_enabled);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "width": 800, "mode": "mandala" }"#).unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 512);
        assert_eq!(config.mode, DrawingMode::Mandala);
    }

    #[test]
    fn test_load_falls_back() {
        let dir = tempdir().unwrap();
        assert_eq!(AppConfig::load(&dir.path().join("missing.json")), AppConfig::default());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ width: ").unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_storage_uses_configured_dir() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            storage_dir: Some(dir.path().join("projects")),
            ..AppConfig::default()
        };
        let storage = config.storage().unwrap();
        assert_eq!(storage.base_path(), dir.path().join("projects").as_path());
    }
}
