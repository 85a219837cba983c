//! Persisted rec-cue configuration.
//!
//! The file lives at `~/.config/rec-cue/config.yaml` (XDG convention on every
//! platform except Windows, where `%APPDATA%\rec-cue\config.yaml` is used).

use crate::defaults;
use crate::error::ConfigError;
use crate::types::{FolderStatus, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum number of monitored folders.
pub const MAX_FOLDERS: usize = 5;

/// Layout version written by this build.
///
/// Version 0 stored a single `monitored_folder_path`; version 1 stores a list.
pub const CURRENT_VERSION: u32 = 1;

/// Returns true if `path` is non-blank and names an existing directory.
pub fn is_path_valid(path: &str) -> bool {
    FolderStatus::of(path) == FolderStatus::Valid
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Layout version; files without it are treated as version 0.
    #[serde(default)]
    pub version: u32,

    /// Legacy single-folder path, read only so old files migrate cleanly.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub monitored_folder_path: String,

    /// Up to [`MAX_FOLDERS`] monitored folder paths. Blank entries are unused slots.
    #[serde(default)]
    pub monitored_folder_paths: Vec<String>,

    /// Silence (ms) after the last detected write before recording is considered stopped
    #[serde(default = "defaults::inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,

    /// Poll fallback interval (ms) while a folder shows activity
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How often (ms) the host re-checks missing folders so watchers can resume
    #[serde(default = "defaults::folder_recheck_interval_ms")]
    pub folder_recheck_interval_ms: u64,

    /// Reload this file automatically when it changes on disk
    #[serde(default = "defaults::bool_true")]
    pub hot_reload: bool,

    /// Debounce (ms) applied to config file change notifications
    #[serde(default = "defaults::config_reload_delay_ms")]
    pub config_reload_delay_ms: u64,

    /// Debug log verbosity
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            monitored_folder_path: String::new(),
            monitored_folder_paths: Vec::new(),
            inactivity_timeout_ms: defaults::inactivity_timeout_ms(),
            poll_interval_ms: defaults::poll_interval_ms(),
            folder_recheck_interval_ms: defaults::folder_recheck_interval_ms(),
            hot_reload: defaults::bool_true(),
            config_reload_delay_ms: defaults::config_reload_delay_ms(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: replace the monitored folder list
    pub fn with_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.monitored_folder_paths = folders.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the inactivity timeout in milliseconds
    pub fn with_inactivity_timeout_ms(mut self, ms: u64) -> Self {
        self.inactivity_timeout_ms = ms;
        self
    }

    /// Builder: set the poll fallback interval in milliseconds
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Inactivity timeout as a `Duration`
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    /// Poll fallback interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Folder re-check interval as a `Duration`
    pub fn folder_recheck_interval(&self) -> Duration {
        Duration::from_millis(self.folder_recheck_interval_ms)
    }

    /// True if at least one monitored folder path is valid.
    pub fn has_any_valid_monitored_folder(&self) -> bool {
        self.monitored_folder_paths.iter().any(|p| is_path_valid(p))
    }

    /// True if any non-blank configured folder does NOT exist on disk.
    ///
    /// Drives the "folder missing" indicator state.
    pub fn has_any_invalid_non_empty_folder(&self) -> bool {
        self.monitored_folder_paths
            .iter()
            .any(|p| FolderStatus::of(p) == FolderStatus::Missing)
    }

    /// Classify every configured slot, in order.
    pub fn folder_statuses(&self) -> Vec<(&str, FolderStatus)> {
        self.monitored_folder_paths
            .iter()
            .map(|p| (p.as_str(), FolderStatus::of(p)))
            .collect()
    }

    /// Migrate from version 0 (single folder) to version 1 (folder list).
    ///
    /// Returns true if anything changed. Call once after deserialization.
    pub fn migrate(&mut self) -> bool {
        if self.version >= CURRENT_VERSION {
            return false;
        }

        if !self.monitored_folder_path.trim().is_empty() && self.monitored_folder_paths.is_empty()
        {
            log::info!(
                "Migrating legacy monitored folder {:?} into folder list",
                self.monitored_folder_path
            );
            self.monitored_folder_paths
                .push(self.monitored_folder_path.clone());
        }
        self.monitored_folder_path.clear();
        self.version = CURRENT_VERSION;
        true
    }

    /// Remove blank entries and enforce [`MAX_FOLDERS`].
    pub fn clean_paths(&mut self) {
        let before = self.monitored_folder_paths.len();
        self.monitored_folder_paths.retain(|p| !p.trim().is_empty());
        self.monitored_folder_paths.truncate(MAX_FOLDERS);
        let removed = before - self.monitored_folder_paths.len();
        if removed > 0 {
            log::debug!("Cleaned {} unused folder slot(s)", removed);
        }
    }

    /// Check semantic constraints the type system can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inactivity_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "inactivity_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.folder_recheck_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "folder_recheck_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from the default location, creating it if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, creating a default file if absent.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            log::info!("Loading existing config from {:?}", config_path);
            let contents = fs::read_to_string(config_path)?;
            let mut config: Config = if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml_ng::from_str(&contents)?
            };

            if config.migrate() {
                config.save_to(config_path)?;
                log::info!("Config migrated to version {}", CURRENT_VERSION);
            }
            config.validate()?;
            Ok(config)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            log::info!("Default config created successfully");
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `config_path`.
    ///
    /// Blank slots are dropped and the folder list is truncated before writing.
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tidy = self.clone();
        tidy.clean_paths();
        let yaml = serde_yaml_ng::to_string(&tidy)?;
        fs::write(config_path, yaml)?;
        Ok(())
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("rec-cue")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("rec-cue")
            } else {
                PathBuf::from(".")
            }
        }
    }
}
