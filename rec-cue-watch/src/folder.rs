//! Hybrid activity watcher for a single folder.
//!
//! Native notifications (inotify, FSEvents, ReadDirectoryChangesW) give
//! low-latency pulses. Each native event also arms a poll fallback that rescans
//! the folder one interval later; the poll keeps rearming for as long as scans
//! keep finding new or newer files, and goes idle after the first quiet scan.
//! This catches long appends to an already-open file, which many backends only
//! report once, without polling idle folders.
//!
//! Locking: `state` guards every mutable field and is never held while pulses
//! are emitted. `emit_gate` is held across the check-then-emit sequence, so
//! `stop_monitoring` on another thread waits for an in-flight pulse to finish.
//! It is reentrant, so a pulse handler may stop this same watcher.

use crate::pulse::{PulseListeners, SubscriptionId};
use crate::scan::{Baseline, scan_folder};
use crate::timer::DeadlineTimer;
use notify::{
    Config as NotifyConfig, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode,
    Watcher,
};
use parking_lot::{Mutex, ReentrantMutex};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

/// Default poll fallback interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

type NativeWatch = Box<dyn Watcher + Send>;

/// Watches one folder and emits a pulse whenever activity is seen.
///
/// Cloning yields another handle to the same watcher; use [`ptr_eq`] to
/// compare identity.
///
/// [`ptr_eq`]: FolderActivityWatcher::ptr_eq
#[derive(Clone)]
pub struct FolderActivityWatcher {
    inner: Arc<WatcherInner>,
}

struct WatcherInner {
    me: Weak<WatcherInner>,
    state: Mutex<WatchState>,
    listeners: PulseListeners,
    emit_gate: ReentrantMutex<()>,
    poll_interval: Duration,
}

struct WatchState {
    path: Option<PathBuf>,
    native: Option<NativeWatch>,
    baseline: Baseline,
    monitoring: bool,
    /// Bumped on every stop so callbacks from an older subscription are ignored.
    session: u64,
    /// Created on the first native event and reused across restarts.
    poll: Option<DeadlineTimer>,
}

impl WatchState {
    /// Clear monitoring state and hand back the native handle so the caller
    /// can drop it without holding the lock.
    fn stop(&mut self) -> Option<NativeWatch> {
        self.monitoring = false;
        self.session = self.session.wrapping_add(1);
        self.path = None;
        if let Some(poll) = &self.poll {
            poll.disarm();
        }
        self.native.take()
    }

    fn is_current(&self, session: u64) -> bool {
        self.monitoring && self.session == session
    }
}

impl std::fmt::Debug for FolderActivityWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FolderActivityWatcher")
            .field("path", &state.path)
            .field("monitoring", &state.monitoring)
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Default for FolderActivityWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderActivityWatcher {
    /// Create an idle watcher with the default poll interval.
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create an idle watcher that polls every `poll_interval` while active.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let inner = Arc::new_cyclic(|me| WatcherInner {
            me: me.clone(),
            state: Mutex::new(WatchState {
                path: None,
                native: None,
                baseline: Baseline::fresh(),
                monitoring: false,
                session: 0,
                poll: None,
            }),
            listeners: PulseListeners::new(),
            emit_gate: ReentrantMutex::new(()),
            poll_interval,
        });
        Self { inner }
    }

    /// Start monitoring `path`, replacing any previous watch on this instance.
    ///
    /// Silently does nothing if `path` is not an existing directory. A fresh
    /// poll baseline is taken on every successful start.
    pub fn start_monitoring(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !path.is_dir() {
            log::debug!("Not watching {}: not a directory", path.display());
            return;
        }
        if let Err(e) = self.inner.subscribe(path) {
            log::warn!("Failed to watch {}: {}", path.display(), e);
        }
    }

    /// Stop monitoring. Idempotent.
    pub fn stop_monitoring(&self) {
        self.inner.stop();
    }

    /// Stop monitoring and drop every pulse subscriber. Idempotent.
    pub fn dispose(&self) {
        self.inner.stop();
        self.inner.listeners.clear();
    }

    /// Register a pulse handler.
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.listeners.subscribe(handler)
    }

    /// Remove a pulse handler. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.state.lock().monitoring
    }

    /// Folder currently being monitored.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.state.lock().path.clone()
    }

    /// True while the poll fallback has a tick scheduled.
    pub fn is_polling(&self) -> bool {
        let state = self.inner.state.lock();
        state.poll.as_ref().is_some_and(DeadlineTimer::is_armed)
    }

    /// Current poll baseline, if monitoring.
    pub fn baseline(&self) -> Option<Baseline> {
        let state = self.inner.state.lock();
        state.monitoring.then_some(state.baseline)
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// True if both handles refer to the same watcher.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(test)]
    fn inject_native_error(&self) {
        let session = self.inner.state.lock().session;
        self.inner
            .on_native_error(session, notify::Error::generic("injected"));
    }
}

impl WatcherInner {
    /// Tear down any existing watch and subscribe natively to `path`.
    fn subscribe(&self, path: &Path) -> notify::Result<()> {
        self.stop();
        let session = self.state.lock().session;

        // Built without the state lock; its callbacks are ignored until installed.
        let native = self.create_native(session, path)?;

        let mut state = self.state.lock();
        if state.session != session {
            // Another start/stop won the race; ours is stale.
            drop(state);
            drop(native);
            return Ok(());
        }
        state.native = Some(native);
        state.path = Some(path.to_path_buf());
        state.baseline = Baseline::fresh();
        state.monitoring = true;
        log::info!("Watching folder {}", path.display());
        Ok(())
    }

    fn stop(&self) {
        let retired = {
            let _gate = self.emit_gate.lock();
            let mut state = self.state.lock();
            let was_monitoring = state.monitoring;
            let path = state.path.clone();
            let retired = state.stop();
            if was_monitoring && let Some(path) = path {
                log::info!("Stopped watching folder {}", path.display());
            }
            retired
        };
        // Dropped outside both locks: some backends join their callback thread.
        drop(retired);
    }

    /// Native backend first; fall back to notify's own poller where the
    /// platform backend can't start (containers, some network filesystems).
    fn create_native(&self, session: u64, path: &Path) -> notify::Result<NativeWatch> {
        let native_me = self.me.clone();
        let mut watcher: NativeWatch =
            match RecommendedWatcher::new(
                move |res: notify::Result<Event>| dispatch_native(&native_me, session, res),
                NotifyConfig::default(),
            ) {
                Ok(w) => Box::new(w),
                Err(e) => {
                    log::warn!(
                        "Native watcher unavailable for {} ({}); falling back to PollWatcher",
                        path.display(),
                        e
                    );
                    let poll_me = self.me.clone();
                    Box::new(PollWatcher::new(
                        move |res: notify::Result<Event>| dispatch_native(&poll_me, session, res),
                        NotifyConfig::default().with_poll_interval(self.poll_interval),
                    )?)
                }
            };
        watcher.watch(path, RecursiveMode::Recursive)?;
        Ok(watcher)
    }

    fn on_native_activity(&self, session: u64) {
        let _gate = self.emit_gate.lock();
        {
            let mut state = self.state.lock();
            if !state.is_current(session) {
                return;
            }
            state.baseline.time = SystemTime::now();
            self.rearm_poll(&mut state);
        }
        log::trace!("Native activity pulse");
        self.listeners.emit();
    }

    /// Schedule the next poll tick one full interval from now.
    fn rearm_poll(&self, state: &mut WatchState) {
        if state.poll.is_none() {
            let me = self.me.clone();
            match DeadlineTimer::spawn("rec-cue-poll", move || {
                if let Some(inner) = me.upgrade() {
                    inner.on_poll_tick();
                }
            }) {
                Ok(timer) => state.poll = Some(timer),
                Err(e) => {
                    log::error!("Failed to start poll timer: {}", e);
                    return;
                }
            }
        }
        if let Some(poll) = &state.poll {
            poll.arm_after(self.poll_interval);
        }
    }

    fn on_poll_tick(&self) {
        let (session, path) = {
            let state = self.state.lock();
            match (&state.path, state.monitoring) {
                (Some(path), true) => (state.session, path.clone()),
                _ => return,
            }
        };

        // One bounded traversal, without the state lock.
        let snapshot = scan_folder(&path);

        let _gate = self.emit_gate.lock();
        {
            let mut state = self.state.lock();
            if !state.is_current(session) {
                return;
            }
            match snapshot {
                None => {
                    log::warn!(
                        "Folder {} is gone; poll fallback stopped",
                        path.display()
                    );
                    return;
                }
                Some(snapshot) if snapshot.shows_activity_since(&state.baseline) => {
                    state.baseline = snapshot.advance(SystemTime::now());
                    self.rearm_poll(&mut state);
                }
                Some(_) => {
                    log::trace!("Poll found no activity in {}; going idle", path.display());
                    return;
                }
            }
        }
        log::trace!("Poll activity pulse for {}", path.display());
        self.listeners.emit();
    }

    /// The native subscription failed: tear down and resubscribe once.
    ///
    /// Runs on a helper thread because the failing backend may be the one
    /// invoking us, and dropping a watcher from its own callback can block.
    fn on_native_error(&self, session: u64, error: notify::Error) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        if !self.state.lock().is_current(session) {
            return;
        }
        log::warn!("Native watcher error: {}; restarting", error);

        let spawned = std::thread::Builder::new()
            .name("rec-cue-watch-recover".to_string())
            .spawn(move || me.recover(session));
        if let Err(e) = spawned {
            log::error!("Failed to spawn watcher recovery thread: {}", e);
        }
    }

    fn recover(&self, session: u64) {
        let (path, retired) = {
            let _gate = self.emit_gate.lock();
            let mut state = self.state.lock();
            if !state.is_current(session) {
                return;
            }
            let path = state.path.clone();
            (path, state.stop())
        };
        drop(retired);

        let Some(path) = path else {
            return;
        };
        if !path.is_dir() {
            log::warn!(
                "Folder {} no longer exists; watcher stays stopped",
                path.display()
            );
            return;
        }
        match self.subscribe(&path) {
            Ok(()) => log::info!("Resubscribed to {}", path.display()),
            Err(e) => log::warn!(
                "Resubscribing to {} failed ({}); watcher stays stopped",
                path.display(),
                e
            ),
        }
    }
}

fn dispatch_native(me: &Weak<WatcherInner>, session: u64, res: notify::Result<Event>) {
    let Some(inner) = me.upgrade() else {
        return;
    };
    match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                inner.on_native_activity(session);
            }
        }
        Err(e) => inner.on_native_error(session, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn counted(watcher: &FolderActivityWatcher) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        watcher.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_start_on_missing_path_is_silent_noop() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.start_monitoring(dir.path().join("missing"));
        assert!(!watcher.is_monitoring());
        assert!(watcher.path().is_none());
        assert!(watcher.baseline().is_none());
    }

    #[test]
    fn test_start_resets_baseline() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.start_monitoring(dir.path());
        let first = watcher.baseline().unwrap();
        assert_eq!(first.file_count, 0);

        std::thread::sleep(Duration::from_millis(20));
        watcher.start_monitoring(dir.path());
        let second = watcher.baseline().unwrap();
        assert_eq!(second.file_count, 0);
        assert!(second.time > first.time);
    }

    #[test]
    fn test_restart_on_different_path() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.start_monitoring(a.path());
        watcher.start_monitoring(b.path());
        assert_eq!(watcher.path().as_deref(), Some(b.path()));
        assert!(watcher.is_monitoring());
    }

    #[test]
    fn test_stop_and_dispose_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.stop_monitoring();
        watcher.start_monitoring(dir.path());
        watcher.stop_monitoring();
        watcher.stop_monitoring();
        watcher.dispose();
        watcher.dispose();
        assert!(!watcher.is_monitoring());
        assert!(!watcher.is_polling());
    }

    #[test]
    fn test_native_event_pulses_and_arms_poll() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::with_poll_interval(Duration::from_secs(10));
        let count = counted(&watcher);
        watcher.start_monitoring(dir.path());
        std::thread::sleep(Duration::from_millis(200));

        fs::write(dir.path().join("clip.bin"), vec![0u8; 1024]).unwrap();
        std::thread::sleep(Duration::from_millis(500));

        assert!(count.load(Ordering::SeqCst) >= 1);
        assert!(watcher.is_polling());
    }

    #[test]
    fn test_stopped_watcher_never_pulses() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::with_poll_interval(Duration::from_millis(100));
        let count = counted(&watcher);
        watcher.start_monitoring(dir.path());
        std::thread::sleep(Duration::from_millis(200));
        watcher.stop_monitoring();

        fs::write(dir.path().join("late.bin"), b"late").unwrap();
        std::thread::sleep(Duration::from_millis(500));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!watcher.is_polling());
    }

    #[test]
    fn test_handler_may_stop_its_own_watcher() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        let count = counted(&watcher);
        let handle = watcher.clone();
        watcher.subscribe(move || handle.stop_monitoring());
        watcher.start_monitoring(dir.path());
        std::thread::sleep(Duration::from_millis(200));

        fs::write(dir.path().join("a.bin"), b"a").unwrap();
        std::thread::sleep(Duration::from_millis(500));

        assert!(count.load(Ordering::SeqCst) >= 1);
        assert!(!watcher.is_monitoring());
    }

    #[test]
    fn test_error_recovery_resubscribes_once() {
        let dir = TempDir::new().unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.start_monitoring(dir.path());
        let before = watcher.baseline().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        watcher.inject_native_error();
        std::thread::sleep(Duration::from_millis(300));

        assert!(watcher.is_monitoring());
        assert_eq!(watcher.path().as_deref(), Some(dir.path()));
        assert!(watcher.baseline().unwrap().time > before.time);
    }

    #[test]
    fn test_error_recovery_gives_up_when_folder_is_gone() {
        let root = TempDir::new().unwrap();
        let folder = root.path().join("clips");
        fs::create_dir(&folder).unwrap();
        let watcher = FolderActivityWatcher::new();
        watcher.start_monitoring(&folder);

        fs::remove_dir_all(&folder).unwrap();
        watcher.inject_native_error();
        std::thread::sleep(Duration::from_millis(300));

        assert!(!watcher.is_monitoring());
    }

    #[test]
    fn test_ptr_eq_tracks_identity() {
        let a = FolderActivityWatcher::new();
        let b = a.clone();
        let c = FolderActivityWatcher::new();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
