//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on `Config`
//! fields, and by `Config::default()`.

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_true() -> bool {
    true
}

// ── Engine timing ──────────────────────────────────────────────────────────

/// Silence required before the indicator drops back to idle.
pub fn inactivity_timeout_ms() -> u64 {
    5_000
}

/// Poll fallback interval for folders with recent activity.
pub fn poll_interval_ms() -> u64 {
    1_000
}

/// How often the host re-checks configured folders for existence.
pub fn folder_recheck_interval_ms() -> u64 {
    2_000
}

/// Debounce applied to config file change notifications.
pub fn config_reload_delay_ms() -> u64 {
    100
}
