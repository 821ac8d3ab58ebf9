// User configuration with file-based persistence.
// Atomic temp-file + rename writes; a missing file means defaults.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Error types for settings persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    /// Platform config directory could not be determined
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// Settings file exists but could not be read or parsed
    #[error("Failed to load settings from {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    /// Settings could not be written
    #[error("Failed to persist settings to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Tunable behavior. Timing fields are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MagpieConfig {
    /// Application name the accessibility layer reports for the file manager
    pub file_manager_app: String,
    /// How long a resolved shell window is trusted without re-resolution
    pub window_cache_ttl_ms: u64,
    /// How long a resolved folder path is trusted without re-resolution
    pub path_cache_ttl_ms: u64,
    /// Debounce window separating single from double taps
    pub double_tap_window_ms: u64,
    /// Delay before automatic announcements resume after a silenced action
    pub restore_announcements_ms: u64,
    /// Interval between progress beeps while a worker runs
    pub progress_beep_interval_ms: u64,
    pub progress_beep_freq_hz: u32,
    pub progress_beep_duration_ms: u32,
    /// Destination root for mirror backups; None disables the action
    pub mirror_backup_dir: Option<PathBuf>,
    /// Defaults for the create-file form
    pub default_file_stem: String,
    pub default_file_extension: String,
    pub max_create_count: usize,
}

impl Default for MagpieConfig {
    fn default() -> Self {
        Self {
            file_manager_app: "explorer".to_string(),
            window_cache_ttl_ms: 1000,
            path_cache_ttl_ms: 2000,
            double_tap_window_ms: 300,
            restore_announcements_ms: 1000,
            progress_beep_interval_ms: 2000,
            progress_beep_freq_hz: 440,
            progress_beep_duration_ms: 100,
            mirror_backup_dir: None,
            default_file_stem: "new_file".to_string(),
            default_file_extension: "txt".to_string(),
            max_create_count: 10,
        }
    }
}

/// Store for the user configuration with file-based persistence
#[derive(Debug)]
pub struct SettingsStore {
    config: MagpieConfig,
    config_path: PathBuf,
}

impl SettingsStore {
    /// Create a store with the given config path; nothing is read yet
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config: MagpieConfig::default(),
            config_path,
        }
    }

    /// Create a store at the platform default location
    pub fn with_default_path() -> Result<Self, SettingsError> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(config_dir.join("magpie").join("config.json")))
    }

    pub fn config(&self) -> &MagpieConfig {
        &self.config
    }

    /// Load the configuration from disk; a missing file keeps defaults
    pub fn load(&mut self) -> Result<(), SettingsError> {
        crate::debug!("Loading settings from {:?}", self.config_path);

        if !self.config_path.exists() {
            crate::debug!("No settings file found, using defaults");
            return Ok(());
        }

        let content = fs::read_to_string(&self.config_path).map_err(|e| SettingsError::Load {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })?;

        self.config = serde_json::from_str(&content).map_err(|e| SettingsError::Load {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })?;

        crate::info!("Loaded settings from {:?}", self.config_path);
        Ok(())
    }

    /// Replace the configuration and persist it
    pub fn set(&mut self, config: MagpieConfig) -> Result<(), SettingsError> {
        self.config = config;
        self.save()
    }

    /// Persist the configuration using atomic write (temp file + rename)
    pub fn save(&self) -> Result<(), SettingsError> {
        crate::debug!("Persisting settings to {:?}", self.config_path);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Persist {
                path: self.config_path.clone(),
                reason: e.to_string(),
            })?;
        }

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| SettingsError::Persist {
                path: self.config_path.clone(),
                reason: e.to_string(),
            })?;

        let temp_path = self.config_path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(|e| SettingsError::Persist {
                path: self.config_path.clone(),
                reason: format!("Failed to create temp file: {}", e),
            })?;
            file.write_all(content.as_bytes())
                .map_err(|e| SettingsError::Persist {
                    path: self.config_path.clone(),
                    reason: format!("Failed to write: {}", e),
                })?;
            file.sync_all().map_err(|e| SettingsError::Persist {
                path: self.config_path.clone(),
                reason: format!("Failed to sync: {}", e),
            })?;
        }

        fs::rename(&temp_path, &self.config_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SettingsError::Persist {
                path: self.config_path.clone(),
                reason: format!("Failed to rename: {}", e),
            }
        })?;

        crate::debug!("Settings persisted successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_timings() {
        let config = MagpieConfig::default();
        assert_eq!(config.file_manager_app, "explorer");
        assert_eq!(config.window_cache_ttl_ms, 1000);
        assert_eq!(config.path_cache_ttl_ms, 2000);
        assert_eq!(config.double_tap_window_ms, 300);
        assert_eq!(config.restore_announcements_ms, 1000);
        assert_eq!(config.progress_beep_interval_ms, 2000);
        assert_eq!(config.max_create_count, 10);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let mut store = SettingsStore::new(dir.path().join("config.json"));
        store.load().unwrap();
        assert_eq!(*store.config(), MagpieConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = MagpieConfig::default();
        config.double_tap_window_ms = 450;
        config.mirror_backup_dir = Some(PathBuf::from("/tmp/backups"));

        let mut store = SettingsStore::new(path.clone());
        store.set(config.clone()).unwrap();

        let mut reloaded = SettingsStore::new(path.clone());
        reloaded.load().unwrap();
        assert_eq!(*reloaded.config(), config);
        assert!(
            !path.with_extension("tmp").exists(),
            "temp file must be renamed away"
        );
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = SettingsStore::new(path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, SettingsError::Load { .. }));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_string(&MagpieConfig::default()).unwrap();
        assert!(json.contains("\"fileManagerApp\""));
        assert!(json.contains("\"doubleTapWindowMs\""));
        assert!(json.contains("\"mirrorBackupDir\""));
    }
}
