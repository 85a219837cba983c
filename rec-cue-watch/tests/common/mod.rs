//! Shared integration test helpers for rec-cue-watch.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` keeps warnings quiet when a file only uses some of
//! the helpers.

#![allow(dead_code)]

use rec_cue_watch::FolderActivityWatcher;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Time given to a native backend to settle after a watch is installed.
pub const SETTLE: Duration = Duration::from_millis(200);

/// Creates `names` as subdirectories of a fresh temp dir.
///
/// The `TempDir` must outlive every watcher pointing into it.
pub fn temp_folders(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let root = TempDir::new().expect("Failed to create temp dir");
    let paths = names
        .iter()
        .map(|name| {
            let path = root.path().join(name);
            fs::create_dir_all(&path).expect("Failed to create folder");
            path
        })
        .collect();
    (root, paths)
}

/// Paths as the string list the registry consumes.
pub fn as_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

/// Subscribe a counter to `watcher`'s pulses.
pub fn pulse_counter(watcher: &FolderActivityWatcher) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    watcher.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

/// Append `bytes` to `path`, creating it if needed.
pub fn append(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("Failed to open file for append");
    file.write_all(bytes).expect("Failed to append");
    file.sync_all().expect("Failed to sync");
}

/// Poll `condition` every 20 ms until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
