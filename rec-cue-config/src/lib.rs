//! Configuration system for the rec-cue recording indicator.
//!
//! This crate provides configuration loading, saving, and default values
//! for the activity-detection engine and its host. It includes:
//!
//! - The persisted monitored-folder list and engine timing settings
//! - Migration from the legacy single-folder layout
//! - Folder validity helpers used by the indicator and recovery policy
//! - Configuration file watching

pub mod config;
pub mod defaults;
pub mod error;
mod types;
#[cfg(feature = "watcher")]
pub mod watcher;

// Re-export main types for convenience
pub use config::{CURRENT_VERSION, Config, MAX_FOLDERS, is_path_valid};
pub use error::ConfigError;
pub use types::{FolderStatus, LogLevel};
