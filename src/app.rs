//! Headless host: configuration, engine, indicator and the main loop.

use crate::cli::RuntimeOptions;
use crate::indicator::ConsoleIndicator;
use crate::recovery::FolderRecovery;
use anyhow::{Context, Result};
use rec_cue_config::watcher::ConfigWatcher;
use rec_cue_config::{Config, MAX_FOLDERS, is_path_valid};
use rec_cue_watch::{ActivityEngine, EngineOptions};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Upper bound on how long the loop waits for a transition before doing housekeeping.
const TICK: Duration = Duration::from_millis(50);

/// Apply CLI overrides on top of a loaded config and re-validate.
pub fn apply_overrides(mut config: Config, options: &RuntimeOptions) -> Result<Config> {
    if !options.folders.is_empty() {
        config.monitored_folder_paths = options.folders.clone();
    }
    if let Some(ms) = options.inactivity_timeout_ms {
        config.inactivity_timeout_ms = ms;
    }
    if let Some(ms) = options.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    config.validate().context("Invalid command-line override")?;
    Ok(config)
}

/// Engine tuning derived from a config.
pub fn engine_options(config: &Config) -> EngineOptions {
    EngineOptions {
        max_folders: MAX_FOLDERS,
        poll_interval: config.poll_interval(),
        inactivity_timeout: config.inactivity_timeout(),
    }
}

/// Main application state
pub struct App {
    options: RuntimeOptions,
    config_path: PathBuf,
    config: Config,
    engine: ActivityEngine,
    transitions: Receiver<bool>,
    indicator: ConsoleIndicator,
    recovery: FolderRecovery,
    config_watcher: Option<ConfigWatcher>,
}

impl App {
    /// Load the config, start the engine and sync the configured folders.
    pub fn new(options: RuntimeOptions) -> Result<Self> {
        let config_path = options
            .config_path
            .clone()
            .unwrap_or_else(Config::config_path);
        let loaded = Config::load_from(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        crate::debug::set_config_level(loaded.log_level.to_level_filter());
        let config = apply_overrides(loaded, &options)?;

        let engine =
            ActivityEngine::new(engine_options(&config)).context("Failed to start engine")?;
        let transitions = engine.subscribe();
        let config_watcher = Self::start_config_watcher(&config, &config_path);

        let mut app = Self {
            options,
            config_path,
            recovery: FolderRecovery::new(config.folder_recheck_interval()),
            config,
            engine,
            transitions,
            indicator: ConsoleIndicator::stdout(),
            config_watcher,
        };
        app.sync_folders()?;
        Ok(app)
    }

    fn start_config_watcher(config: &Config, config_path: &Path) -> Option<ConfigWatcher> {
        if !config.hot_reload {
            log::info!("Config hot reload disabled");
            return None;
        }
        match ConfigWatcher::new(config_path, config.config_reload_delay_ms) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("Config hot reload unavailable: {}", e);
                None
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &ActivityEngine {
        &self.engine
    }

    /// Run until `--exit-after` elapses. Without it, runs until the process is killed.
    pub fn run(mut self) -> Result<()> {
        let deadline = self
            .options
            .exit_after
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map(|after| Instant::now() + after);

        let result = self.main_loop(deadline);
        self.shutdown();
        result
    }

    fn main_loop(&mut self, deadline: Option<Instant>) -> Result<()> {
        loop {
            match self.transitions.recv_timeout(TICK) {
                Ok(active) => {
                    self.indicator.set_recording(active)?;
                    // Drain anything queued behind it so the console never lags.
                    while let Ok(active) = self.transitions.try_recv() {
                        self.indicator.set_recording(active)?;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("Activity engine stopped unexpectedly");
                }
            }

            self.check_config_reload();

            let now = Instant::now();
            if self.recovery.tick(&self.config.monitored_folder_paths, now) {
                self.sync_folders()?;
            }

            if deadline.is_some_and(|at| now >= at) {
                log::info!("Exit-after deadline reached");
                return Ok(());
            }
        }
    }

    /// Reconcile watchers with the configured folders and refresh the indicator.
    fn sync_folders(&mut self) -> Result<()> {
        let folders = &self.config.monitored_folder_paths;
        let report = self.engine.sync(folders);
        log::debug!(
            "Synced folders: {} added, {} removed, {} kept",
            report.added.len(),
            report.removed.len(),
            report.kept
        );
        self.recovery.prime(folders, Instant::now());
        let folder_error = !folders.iter().any(|p| is_path_valid(p));
        self.indicator.set_folder_error(folder_error)?;
        Ok(())
    }

    fn check_config_reload(&mut self) {
        let changed = self
            .config_watcher
            .as_ref()
            .is_some_and(ConfigWatcher::take_pending);
        if !changed {
            return;
        }
        if let Err(e) = self.reload_config() {
            log::error!("Config reload failed, keeping previous settings: {:#}", e);
        }
    }

    fn reload_config(&mut self) -> Result<()> {
        let loaded = Config::load_from(&self.config_path)?;
        crate::debug::set_config_level(loaded.log_level.to_level_filter());
        let config = apply_overrides(loaded, &self.options)?;

        if engine_options(&config) != self.engine.options() {
            log::info!("Engine timing changed; restarting engine");
            let engine =
                ActivityEngine::new(engine_options(&config)).context("Failed to restart engine")?;
            let old = std::mem::replace(&mut self.engine, engine);
            old.shutdown();
            self.transitions = self.engine.subscribe();
            self.indicator.set_recording(false)?;
        }

        self.recovery.set_interval(config.folder_recheck_interval());
        self.config = config;
        self.sync_folders()?;
        log::info!("Config reloaded from {}", self.config_path.display());
        Ok(())
    }

    /// Stop every watcher and the detector.
    pub fn shutdown(&mut self) {
        log::info!("Shutting down");
        self.config_watcher = None;
        self.engine.shutdown();
    }
}
