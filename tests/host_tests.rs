//! Host-level behaviour: config round trips through the CLI helpers and
//! folder recovery driving the engine.

use rec_cue::app::{apply_overrides, engine_options};
use rec_cue::cli::RuntimeOptions;
use rec_cue::cli::commands::{check_cli, init_cli};
use rec_cue::config::Config;
use rec_cue::indicator::{ConsoleIndicator, IndicatorState};
use rec_cue::recovery::FolderRecovery;
use rec_cue::watch::ActivityEngine;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_init_then_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.yaml");

    init_cli(Some(&config_path), false).expect("init");
    // A fresh config has no folders, so nothing can be monitored yet.
    assert!(!check_cli(Some(&config_path)).expect("check"));

    let folder = temp_dir.path().join("clips");
    fs::create_dir(&folder).unwrap();
    Config::load_from(&config_path)
        .unwrap()
        .with_folders([folder.to_string_lossy()])
        .save_to(&config_path)
        .unwrap();
    assert!(check_cli(Some(&config_path)).expect("check"));
}

#[test]
fn test_missing_folder_is_picked_up_after_it_appears() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().join("clips");
    let options = RuntimeOptions {
        folders: vec![folder.to_string_lossy().into_owned()],
        poll_interval_ms: Some(100),
        inactivity_timeout_ms: Some(300),
        ..RuntimeOptions::default()
    };
    let config = apply_overrides(Config::default(), &options).unwrap();
    let engine = ActivityEngine::new(engine_options(&config)).unwrap();
    let folders = &config.monitored_folder_paths;

    let start = Instant::now();
    let mut recovery = FolderRecovery::new(Duration::from_millis(100));
    engine.sync(folders);
    recovery.prime(folders, start);
    assert!(engine.watched_paths().is_empty());
    assert!(recovery.in_error());

    fs::create_dir(&folder).unwrap();
    assert!(recovery.tick(folders, start + Duration::from_millis(150)));
    engine.sync(folders);
    assert_eq!(engine.watched_paths(), vec![folder.clone()]);

    fs::remove_dir(&folder).unwrap();
    assert!(recovery.tick(folders, start + Duration::from_millis(300)));
    engine.sync(folders);
    assert!(engine.watched_paths().is_empty());
}

#[test]
fn test_indicator_follows_engine_transitions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let engine = ActivityEngine::new(rec_cue::watch::EngineOptions {
        poll_interval: Duration::from_millis(100),
        inactivity_timeout: Duration::from_millis(300),
        ..Default::default()
    })
    .unwrap();
    let transitions = engine.subscribe();
    engine.sync([temp_dir.path().to_string_lossy()]);
    std::thread::sleep(Duration::from_millis(200));

    let mut indicator = ConsoleIndicator::new(Vec::new());
    indicator.render().unwrap();
    fs::write(temp_dir.path().join("take.wav"), b"RIFF").unwrap();

    let active = transitions
        .recv_timeout(Duration::from_secs(2))
        .expect("activation");
    indicator.set_recording(active).unwrap();
    assert_eq!(indicator.shown(), Some(IndicatorState::Recording));

    let active = transitions
        .recv_timeout(Duration::from_secs(2))
        .expect("deactivation");
    indicator.set_recording(active).unwrap();
    assert_eq!(indicator.shown(), Some(IndicatorState::Idle));

    let out = String::from_utf8(indicator.into_inner()).unwrap();
    assert_eq!(out, "○ idle\n● REC\n○ idle\n");
}
