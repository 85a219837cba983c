use rec_cue_config::{CURRENT_VERSION, Config, ConfigError, LogLevel, MAX_FOLDERS, is_path_valid};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.version, CURRENT_VERSION);
    assert!(config.monitored_folder_path.is_empty());
    assert!(config.monitored_folder_paths.is_empty());
    assert_eq!(config.inactivity_timeout_ms, 5000);
    assert_eq!(config.poll_interval_ms, 1000);
    assert!(config.hot_reload);
    assert_eq!(config.log_level, LogLevel::Off);
    assert_eq!(MAX_FOLDERS, 5);
}

#[test]
fn test_is_path_valid_empty_and_whitespace() {
    assert!(!is_path_valid(""));
    assert!(!is_path_valid("   "));
}

#[test]
fn test_is_path_valid_nonexistent() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope");
    assert!(!is_path_valid(missing.to_str().unwrap()));
}

#[test]
fn test_is_path_valid_file_is_not_a_folder() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("clip.mp4");
    fs::write(&file, b"x").unwrap();
    assert!(!is_path_valid(file.to_str().unwrap()));
}

#[test]
fn test_is_path_valid_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(is_path_valid(temp_dir.path().to_str().unwrap()));
}

#[test]
fn test_folder_validity_helpers() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.path().to_str().unwrap().to_string();
    let bad = temp_dir.path().join("gone").to_str().unwrap().to_string();

    let config = Config::default().with_folders(["", good.as_str()]);
    assert!(config.has_any_valid_monitored_folder());
    assert!(!config.has_any_invalid_non_empty_folder());

    let config = Config::default().with_folders([good.as_str(), bad.as_str()]);
    assert!(config.has_any_valid_monitored_folder());
    assert!(config.has_any_invalid_non_empty_folder());

    let config = Config::default().with_folders(["  "]);
    assert!(!config.has_any_valid_monitored_folder());
    assert!(!config.has_any_invalid_non_empty_folder());
}

#[test]
fn test_load_creates_default_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rec-cue").join("config.yaml");

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config, Config::default());
    assert!(path.exists());
}

#[test]
fn test_save_and_load_round_trip_cleans_slots() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");

    let config = Config::default()
        .with_folders(["/a", "", "/b", "/c", "/d", "/e", "/f"])
        .with_inactivity_timeout_ms(3000);
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.monitored_folder_paths, vec!["/a", "/b", "/c", "/d", "/e"]);
    assert_eq!(loaded.inactivity_timeout_ms, 3000);
}

#[test]
fn test_legacy_single_folder_migrates_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "monitored_folder_path: /recordings\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.version, CURRENT_VERSION);
    assert_eq!(config.monitored_folder_paths, vec!["/recordings"]);
    assert!(config.monitored_folder_path.is_empty());

    // Migration is persisted so the legacy key disappears from disk.
    let on_disk = fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains("monitored_folder_path:"));
    assert!(on_disk.contains("/recordings"));
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(
        &path,
        "version: 1\nmonitored_folder_paths: [/x]\nlog_level: debug\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.monitored_folder_paths, vec!["/x"]);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.poll_interval_ms, 1000);
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "monitored_folder_paths: [unclosed\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_zero_timeout_is_validation_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "version: 1\ninactivity_timeout_ms: 0\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}
