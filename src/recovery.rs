//! Re-sync policy for folders that appear or disappear while running.
//!
//! The registry skips folders that don't exist when `sync` runs and never
//! retries them on its own. This module periodically recomputes which
//! configured folders exist and asks the host to sync again when that set
//! changes.

use rec_cue_config::is_path_valid;
use std::time::{Duration, Instant};

/// Periodic check of which configured folders currently exist.
#[derive(Debug)]
pub struct FolderRecovery {
    interval: Duration,
    last_check: Option<Instant>,
    valid: Vec<String>,
    in_error: bool,
}

impl FolderRecovery {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: None,
            valid: Vec::new(),
            in_error: false,
        }
    }

    /// Record the state that the last `sync` was based on.
    pub fn prime(&mut self, folders: &[String], now: Instant) {
        self.valid = valid_set(folders);
        self.in_error = has_invalid(folders);
        self.last_check = Some(now);
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// True if any non-blank folder was missing at the last check.
    pub fn in_error(&self) -> bool {
        self.in_error
    }

    /// Returns true when a re-sync is needed. Does nothing until `interval`
    /// has passed since the previous check.
    pub fn tick(&mut self, folders: &[String], now: Instant) -> bool {
        if self
            .last_check
            .is_some_and(|last| now.duration_since(last) < self.interval)
        {
            return false;
        }
        self.last_check = Some(now);

        let valid = valid_set(folders);
        let in_error = has_invalid(folders);
        if self.in_error && !in_error {
            log::info!("All configured folders are available again");
        } else if !self.in_error && in_error {
            log::warn!("A configured folder is missing");
        }
        self.in_error = in_error;

        if valid == self.valid {
            return false;
        }
        log::info!(
            "Available folders changed ({} -> {}); re-syncing watchers",
            self.valid.len(),
            valid.len()
        );
        self.valid = valid;
        true
    }
}

fn valid_set(folders: &[String]) -> Vec<String> {
    let mut valid: Vec<String> = folders
        .iter()
        .filter(|p| is_path_valid(p))
        .map(|p| p.trim().to_lowercase())
        .collect();
    valid.sort();
    valid.dedup();
    valid
}

fn has_invalid(folders: &[String]) -> bool {
    folders
        .iter()
        .any(|p| !p.trim().is_empty() && !is_path_valid(p))
}
