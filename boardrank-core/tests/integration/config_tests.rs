//! Integration tests for settings files feeding the reconciler

use std::time::Duration;

use boardrank_core::{BoardSettings, CommitPolicy, ConfigError, ConfigManager, ReconcilerConfig};
use boardrank_core::{TracingConfig, TracingLevel};

#[test]
fn settings_file_drives_reconciler_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("settings.toml"),
        r#"
persist_timeout_ms = 1500
commit_policy = "supersede"
max_rank_len = 16

[logging]
level = "debug"
"#,
    )
    .expect("write settings");

    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    let settings = manager.load_settings().expect("valid settings");
    let config = ReconcilerConfig::from_settings(&settings);

    assert_eq!(config.persist_timeout, Duration::from_millis(1500));
    assert_eq!(config.commit_policy, CommitPolicy::Supersede);
    assert_eq!(config.max_rank_len, 16);
    assert_eq!(
        TracingConfig::from_settings(&settings.logging).level,
        TracingLevel::Debug
    );
}

#[test]
fn malformed_settings_file_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("settings.toml"), "commit_policy = [").expect("write");

    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    assert!(matches!(manager.load_settings(), Err(ConfigError::Parse(_))));
}

#[test]
fn unknown_policy_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("settings.toml"),
        "commit_policy = \"whatever\"\n",
    )
    .expect("write");

    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    assert!(manager.load_settings().is_err());
}

#[test]
fn saved_settings_round_trip_through_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manager = ConfigManager::with_config_dir(dir.path().join("nested"));
    let settings = BoardSettings {
        default_partitions: vec!["Inbox".to_string(), "Done".to_string()],
        ..BoardSettings::default()
    };

    manager.save_settings(&settings).expect("save");
    assert!(manager.settings_path().exists());
    assert_eq!(manager.load_settings().expect("load"), settings);
}
