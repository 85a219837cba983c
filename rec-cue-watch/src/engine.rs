//! Registry and state machine wired together.

use crate::detector::{ActivityStateMachine, DEFAULT_INACTIVITY_TIMEOUT};
use crate::error::WatchError;
use crate::folder::DEFAULT_POLL_INTERVAL;
use crate::pulse::SubscriptionId;
use crate::registry::{DEFAULT_MAX_FOLDERS, SyncReport, WatcherRegistry};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Tunables for [`ActivityEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub max_folders: usize,
    pub poll_interval: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_folders: DEFAULT_MAX_FOLDERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
        }
    }
}

/// Aggregate pulses from every watched folder drive one activity signal.
#[derive(Debug)]
pub struct ActivityEngine {
    registry: WatcherRegistry,
    detector: ActivityStateMachine,
    options: EngineOptions,
    pulse_subscription: Mutex<Option<SubscriptionId>>,
}

impl ActivityEngine {
    pub fn new(options: EngineOptions) -> Result<Self, WatchError> {
        let detector = ActivityStateMachine::new(options.inactivity_timeout)?;
        let registry = WatcherRegistry::new(options.max_folders, options.poll_interval);
        let pulses = detector.clone();
        let subscription = registry.subscribe(move || pulses.on_pulse());
        log::debug!(
            "Activity engine ready (max {} folders, poll {:?}, timeout {:?})",
            options.max_folders,
            options.poll_interval,
            options.inactivity_timeout
        );
        Ok(Self {
            registry,
            detector,
            options,
            pulse_subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Reconcile watched folders with `desired`. See [`WatcherRegistry::sync`].
    pub fn sync<I, S>(&self, desired: I) -> SyncReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.sync(desired)
    }

    /// Stop every folder watcher. The detector keeps running and times out
    /// normally if it was active.
    pub fn stop_all(&self) {
        self.registry.stop_all();
    }

    /// Receive active/inactive transitions.
    pub fn subscribe(&self) -> Receiver<bool> {
        self.detector.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.detector.is_active()
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.registry.watched_paths()
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn registry(&self) -> &WatcherRegistry {
        &self.registry
    }

    pub fn detector(&self) -> &ActivityStateMachine {
        &self.detector
    }

    /// Stop watchers, detach the detector and stop its scheduler. Idempotent.
    pub fn shutdown(&self) {
        if let Some(id) = self.pulse_subscription.lock().take() {
            self.registry.unsubscribe(id);
        }
        self.registry.stop_all();
        self.detector.dispose();
    }
}

impl Drop for ActivityEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_options() -> EngineOptions {
        EngineOptions {
            poll_interval: Duration::from_millis(100),
            inactivity_timeout: Duration::from_millis(300),
            ..EngineOptions::default()
        }
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.max_folders, 5);
        assert_eq!(options.poll_interval, Duration::from_millis(1000));
        assert_eq!(options.inactivity_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_sync_and_watched_paths() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ActivityEngine::new(fast_options()).unwrap();
        let folder = temp_dir.path().to_string_lossy().into_owned();

        let report = engine.sync([folder.as_str()]);
        assert_eq!(report.added.len(), 1);
        assert_eq!(engine.watched_paths(), vec![temp_dir.path().to_path_buf()]);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_folder_write_drives_detector() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ActivityEngine::new(fast_options()).unwrap();
        let rx = engine.subscribe();
        engine.sync([temp_dir.path().to_string_lossy()]);

        std::thread::sleep(Duration::from_millis(100));
        std::fs::write(temp_dir.path().join("take1.wav"), b"RIFF").unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(3)), Ok(true));
        assert_eq!(rx.recv_timeout(Duration::from_secs(3)), Ok(false));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_shutdown_detaches_detector() {
        let engine = ActivityEngine::new(fast_options()).unwrap();
        let rx = engine.subscribe();
        engine.shutdown();
        assert!(engine.pulse_subscription.lock().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ActivityEngine::new(fast_options()).unwrap();
        engine.sync([temp_dir.path().to_string_lossy()]);

        engine.shutdown();
        engine.shutdown();
        assert!(engine.watched_paths().is_empty());
        assert!(engine.registry().is_empty());
    }
}
