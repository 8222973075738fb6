//! Tests for bootstrap configuration resolution
//!
//! Covers:
//! - Missing TOML file falls back to defaults without failing
//! - Priority order: CLI overrides > PORT env > TOML > defaults
//! - Malformed TOML is reported as a configuration error
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that read or write PORT are marked with #[serial].

use idrec_common::config::{
    load_toml_config, ConfigOverrides, ServiceConfig, DEFAULT_HOST, DEFAULT_PORT, PORT_ENV,
};
use idrec_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("idrec.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    env::remove_var(PORT_ENV);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = ServiceConfig::resolve(Some(&missing), ConfigOverrides::default()).unwrap();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.host, DEFAULT_HOST);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.database_path.file_name().unwrap(), "contacts.db");
}

#[test]
#[serial]
fn test_toml_values_are_applied() {
    env::remove_var(PORT_ENV);
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
host = "127.0.0.1"
port = 4100
database_path = "/tmp/idrec-config-test.db"

[logging]
level = "debug"
"#,
    );

    let config = ServiceConfig::resolve(Some(&path), ConfigOverrides::default()).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 4100);
    assert_eq!(config.database_path, PathBuf::from("/tmp/idrec-config-test.db"));
    assert_eq!(config.log_level, "debug");
}

#[test]
#[serial]
fn test_port_env_overrides_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = 4100\n");

    env::set_var(PORT_ENV, "4200");
    let config = ServiceConfig::resolve(Some(&path), ConfigOverrides::default()).unwrap();
    env::remove_var(PORT_ENV);

    assert_eq!(config.port, 4200);
}

#[test]
#[serial]
fn test_cli_override_beats_env_and_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = 4100\nhost = \"10.0.0.1\"\n");

    env::set_var(PORT_ENV, "4200");
    let overrides = ConfigOverrides {
        host: Some("localhost".to_string()),
        port: Some(4300),
        database_path: Some(PathBuf::from("cli.db")),
        log_level: Some("warn".to_string()),
    };
    let config = ServiceConfig::resolve(Some(&path), overrides).unwrap();
    env::remove_var(PORT_ENV);

    assert_eq!(config.port, 4300);
    assert_eq!(config.host, "localhost");
    assert_eq!(config.database_path, PathBuf::from("cli.db"));
    assert_eq!(config.log_level, "warn");
}

#[test]
#[serial]
fn test_invalid_port_env_is_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("none.toml");

    env::set_var(PORT_ENV, "not-a-port");
    let result = ServiceConfig::resolve(Some(&missing), ConfigOverrides::default());
    env::remove_var(PORT_ENV);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"three thousand\"\n");

    let result = load_toml_config(&path);
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Failed to parse TOML")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
fn test_load_missing_file_returns_none() {
    let dir = TempDir::new().unwrap();
    let result = load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert!(result.is_none());
}
