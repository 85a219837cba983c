//! Folder activity detection for the rec-cue recording indicator.
//!
//! Decides whether a recording is in progress by watching up to a handful of
//! folders for file creation and growth:
//!
//! - [`FolderActivityWatcher`]: one folder, native notifications plus a short
//!   poll fallback that runs only after activity
//! - [`WatcherRegistry`]: the bounded set of watchers, reconciled against the
//!   configured folder list without restarting unchanged entries
//! - [`ActivityStateMachine`]: debounces the aggregate pulse into
//!   active/inactive transitions
//! - [`ActivityEngine`]: the three wired together
//!
//! # Mutex usage
//!
//! Everything here is synchronous and uses `parking_lot` locks. Lock order is
//! registry, then watcher state; pulse handlers run without any watcher state
//! lock held and must not call back into the registry.

pub mod detector;
pub mod engine;
pub mod error;
pub mod folder;
pub mod paths;
pub mod pulse;
pub mod registry;
pub mod scan;
mod timer;

pub use detector::{ActivitySnapshot, ActivityStateMachine, DEFAULT_INACTIVITY_TIMEOUT};
pub use engine::{ActivityEngine, EngineOptions};
pub use error::WatchError;
pub use folder::{DEFAULT_POLL_INTERVAL, FolderActivityWatcher};
pub use paths::{folder_key, normalize_desired};
pub use pulse::{PulseListeners, SubscriptionId};
pub use registry::{DEFAULT_MAX_FOLDERS, SyncReport, WatcherRegistry};
pub use scan::{Baseline, FolderSnapshot, scan_folder};
