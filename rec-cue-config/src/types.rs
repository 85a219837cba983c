//! Small enums shared by the configuration and its consumers.

use serde::{Deserialize, Serialize};

/// Log level for the debug log.
///
/// Controls the verbosity of log output written to the debug log file.
/// Environment variable `RUST_LOG` and the `--log-level` CLI flag take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    #[default]
    Off,
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Most verbose
    Trace,
}

impl LogLevel {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Classification of a single configured folder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    /// Unused slot (empty or whitespace only)
    Blank,
    /// Names an existing directory
    Valid,
    /// Non-empty but no directory exists there
    Missing,
}

impl FolderStatus {
    /// Classify a raw configured path.
    pub fn of(path: &str) -> Self {
        if path.trim().is_empty() {
            FolderStatus::Blank
        } else if std::path::Path::new(path).is_dir() {
            FolderStatus::Valid
        } else {
            FolderStatus::Missing
        }
    }

    /// Short label for status listings
    pub fn label(self) -> &'static str {
        match self {
            FolderStatus::Blank => "blank",
            FolderStatus::Valid => "ok",
            FolderStatus::Missing => "missing",
        }
    }
}
