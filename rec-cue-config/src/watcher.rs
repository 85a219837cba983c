//! Config file watcher for hot reload.
//!
//! Watches `config.yaml` so edits made outside the running host (by hand or by a
//! settings front end) re-sync the monitored folders without a restart.
//! Rapid saves from editors are debounced into a single event.

use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// Poll interval used when the native backend is unavailable.
const FALLBACK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The config file changed on disk and should be reloaded.
#[derive(Debug, Clone)]
pub struct ConfigReloadEvent {
    /// Canonical path of the config file.
    pub path: PathBuf,
}

/// Errors raised while setting up the config watcher.
#[derive(Debug, thiserror::Error)]
pub enum ConfigWatchError {
    /// The config file does not exist yet.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The path has no file name or parent directory component.
    #[error("config path is not a file inside a directory: {0}")]
    BadPath(PathBuf),

    /// Neither the native nor the polling backend could be started.
    #[error("failed to watch config directory {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Watches the config file and queues reload events.
pub struct ConfigWatcher {
    /// Kept alive to maintain the watch.
    _watcher: Box<dyn Watcher + Send>,
    event_receiver: Receiver<ConfigReloadEvent>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher").finish_non_exhaustive()
    }
}

/// Shared state handed to whichever backend ends up running.
#[derive(Clone)]
struct ReloadFilter {
    filename: OsString,
    canonical_path: PathBuf,
    debounce: Duration,
    last_sent: Arc<Mutex<Option<Instant>>>,
    tx: Sender<ConfigReloadEvent>,
}

impl ReloadFilter {
    fn handle(&self, result: Result<Event, notify::Error>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Config watcher error: {}", e);
                return;
            }
        };

        // Create covers editors that save by renaming a temp file over the original.
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        if !event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == self.filename))
        {
            return;
        }

        {
            let now = Instant::now();
            let mut last = self.last_sent.lock();
            if last.is_some_and(|t| now.duration_since(t) < self.debounce) {
                log::trace!("Debouncing config reload event");
                return;
            }
            *last = Some(now);
        }

        log::info!("Config file changed: {}", self.canonical_path.display());
        if let Err(e) = self.tx.send(ConfigReloadEvent {
            path: self.canonical_path.clone(),
        }) {
            log::error!("Failed to send config reload event: {}", e);
        }
    }
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// Uses the platform's native watcher and falls back to a `PollWatcher`
    /// (500 ms) when the native backend can't be initialised, e.g. in containers
    /// or on network filesystems.
    pub fn new(config_path: &Path, debounce_delay_ms: u64) -> Result<Self, ConfigWatchError> {
        if !config_path.exists() {
            return Err(ConfigWatchError::NotFound(config_path.to_path_buf()));
        }

        let canonical = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let (Some(filename), Some(parent_dir)) = (canonical.file_name(), canonical.parent())
        else {
            return Err(ConfigWatchError::BadPath(canonical));
        };
        let filename = filename.to_os_string();
        let parent_dir = parent_dir.to_path_buf();

        let (tx, rx) = channel();
        let filter = ReloadFilter {
            filename,
            canonical_path: canonical.clone(),
            debounce: Duration::from_millis(debounce_delay_ms),
            last_sent: Arc::new(Mutex::new(None)),
            tx,
        };

        let mut watcher = Self::create_watcher(filter).map_err(|source| ConfigWatchError::Notify {
            path: parent_dir.clone(),
            source,
        })?;

        // Watch the parent so atomic-rename saves are still seen.
        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .map_err(|source| ConfigWatchError::Notify {
                path: parent_dir.clone(),
                source,
            })?;

        log::info!("Config hot reload: watching {}", canonical.display());

        Ok(Self {
            _watcher: watcher,
            event_receiver: rx,
        })
    }

    fn create_watcher(filter: ReloadFilter) -> Result<Box<dyn Watcher + Send>, notify::Error> {
        let native_filter = filter.clone();
        match notify::recommended_watcher(move |res: Result<Event, notify::Error>| native_filter.handle(res)) {
            Ok(w) => {
                log::debug!("Config watcher: using native backend");
                Ok(Box::new(w))
            }
            Err(e) => {
                log::warn!(
                    "Config watcher: native backend unavailable ({}); falling back to PollWatcher",
                    e
                );
                let poll = PollWatcher::new(
                    move |res: Result<Event, notify::Error>| filter.handle(res),
                    NotifyConfig::default().with_poll_interval(FALLBACK_POLL_INTERVAL),
                )?;
                Ok(Box::new(poll))
            }
        }
    }

    /// Next pending reload event, if any (non-blocking).
    pub fn try_recv(&self) -> Option<ConfigReloadEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Drain all pending events, returning true if at least one was queued.
    pub fn take_pending(&self) -> bool {
        let mut any = false;
        while self.try_recv().is_some() {
            any = true;
        }
        any
    }
}
