//! Bounded set of folder watchers reconciled against a desired path list.
//!
//! `sync` only touches the difference: folders that stay in the list keep
//! their watcher (and its in-flight poll state); folders that leave are
//! unsubscribed, then disposed; new folders get a fresh watcher. All child
//! pulses are fanned into one aggregate pulse without path information.
//!
//! Lock order is registry, then watcher. Child pulses never take the registry
//! lock, so pulse handlers must not call back into `sync` or `stop_all`.

use crate::folder::{DEFAULT_POLL_INTERVAL, FolderActivityWatcher};
use crate::paths::{absolute_folder, folder_key, normalize_desired};
use crate::pulse::{PulseListeners, SubscriptionId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default cap on simultaneously watched folders.
pub const DEFAULT_MAX_FOLDERS: usize = 5;

/// What a `sync` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub kept: usize,
}

impl SyncReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

struct WatchedFolder {
    path: PathBuf,
    watcher: FolderActivityWatcher,
    subscription: SubscriptionId,
}

impl WatchedFolder {
    /// Unsubscribe first so a late pulse can't reach the fan-in, then dispose.
    fn retire(self) -> PathBuf {
        self.watcher.unsubscribe(self.subscription);
        self.watcher.dispose();
        self.path
    }
}

/// Owns one [`FolderActivityWatcher`] per monitored folder.
pub struct WatcherRegistry {
    watchers: Mutex<HashMap<String, WatchedFolder>>,
    fan_in: Arc<PulseListeners>,
    max_folders: usize,
    poll_interval: Duration,
}

impl std::fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherRegistry")
            .field("folders", &self.watched_paths())
            .field("max_folders", &self.max_folders)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Default for WatcherRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FOLDERS, DEFAULT_POLL_INTERVAL)
    }
}

impl WatcherRegistry {
    pub fn new(max_folders: usize, poll_interval: Duration) -> Self {
        Self {
            watchers: Mutex::new(HashMap::new()),
            fan_in: Arc::new(PulseListeners::new()),
            max_folders,
            poll_interval,
        }
    }

    /// Reconcile the watched folders with `desired`.
    ///
    /// Blank entries and paths that are not existing directories are ignored,
    /// duplicates are compared case-insensitively after making paths absolute,
    /// and only the first `max_folders` survivors (in input order) are kept.
    pub fn sync<I, S>(&self, desired: I) -> SyncReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let desired = normalize_desired(desired, self.max_folders);
        let desired_keys: HashSet<&str> = desired.iter().map(|(key, _)| key.as_str()).collect();
        let mut report = SyncReport::default();

        let mut watchers = self.watchers.lock();

        let stale: Vec<String> = watchers
            .keys()
            .filter(|key| !desired_keys.contains(key.as_str()))
            .cloned()
            .collect();
        for key in stale {
            if let Some(folder) = watchers.remove(&key) {
                report.removed.push(folder.retire());
            }
        }

        for (key, path) in desired {
            if watchers.contains_key(&key) {
                report.kept += 1;
                continue;
            }
            let watcher = FolderActivityWatcher::with_poll_interval(self.poll_interval);
            let fan_in = Arc::clone(&self.fan_in);
            let subscription = watcher.subscribe(move || fan_in.emit());
            watcher.start_monitoring(&path);
            report.added.push(path.clone());
            watchers.insert(
                key,
                WatchedFolder {
                    path,
                    watcher,
                    subscription,
                },
            );
        }

        if !report.is_unchanged() {
            log::info!(
                "Watcher sync: +{} -{} ={} (now {} folder(s))",
                report.added.len(),
                report.removed.len(),
                report.kept,
                watchers.len()
            );
        }
        report
    }

    /// Dispose every watcher and clear the registry. Idempotent.
    pub fn stop_all(&self) {
        let mut watchers = self.watchers.lock();
        if watchers.is_empty() {
            return;
        }
        let count = watchers.len();
        for (_, folder) in watchers.drain() {
            folder.retire();
        }
        log::info!("Stopped all {} folder watcher(s)", count);
    }

    /// Register a handler for the aggregate pulse.
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.fan_in.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.fan_in.unsubscribe(id)
    }

    pub fn len(&self) -> usize {
        self.watchers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.lock().is_empty()
    }

    /// Number of watchers whose native subscription is currently live.
    pub fn monitoring_count(&self) -> usize {
        self.watchers
            .lock()
            .values()
            .filter(|folder| folder.watcher.is_monitoring())
            .count()
    }

    /// Watched folders, sorted by registry key.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let watchers = self.watchers.lock();
        let mut entries: Vec<(&String, &PathBuf)> =
            watchers.iter().map(|(key, folder)| (key, &folder.path)).collect();
        entries.sort();
        entries.into_iter().map(|(_, path)| path.clone()).collect()
    }

    /// Whether `path` (compared case-insensitively, made absolute) is watched.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.watcher(path).is_some()
    }

    /// Handle to the watcher for `path`, if registered.
    pub fn watcher(&self, path: impl AsRef<Path>) -> Option<FolderActivityWatcher> {
        let key = folder_key(&absolute_folder(path.as_ref())?);
        self.watchers
            .lock()
            .get(&key)
            .map(|folder| folder.watcher.clone())
    }

    pub fn max_folders(&self) -> usize {
        self.max_folders
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Drop for WatcherRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
