//! Integration tests for the configuration system

use mirror::config::{ConfigLoader, ValidationError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_file_sets_roots_and_interval() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("mirror.toml");

    std::fs::write(
        &config_file,
        r#"
[sync]
source = "/data/source"
replica = "/backup/replica"
interval_secs = 15
chunk_size = 65536

[logging]
level = "debug"
format = "json"
output = "stderr"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.sync.source, Some(PathBuf::from("/data/source")));
    assert_eq!(config.sync.replica, Some(PathBuf::from("/backup/replica")));
    assert_eq!(config.sync.interval(), Duration::from_secs(15));
    assert_eq!(config.sync.chunk_size, 65536);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_partial_config_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("mirror.toml");
    std::fs::write(&config_file, "[sync]\nsource = \"/s\"\n").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert_eq!(config.sync.interval_secs, 60);
    assert_eq!(config.sync.chunk_size, 4096);
    assert_eq!(config.logging.level, "info");

    let errors = config.validate().unwrap_err();
    assert_eq!(errors, vec![ValidationError::MissingReplica]);
}

#[test]
fn test_zero_interval_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("mirror.toml");
    std::fs::write(
        &config_file,
        "[sync]\nsource = \"/s\"\nreplica = \"/r\"\ninterval_secs = 0\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.ensure_valid().is_err());
}

#[test]
fn test_missing_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}
