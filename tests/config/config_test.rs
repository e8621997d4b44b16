//! Tests for configuration loading, env overrides and validation.

use std::path::PathBuf;

use kernver::config::{load_config, load_with_env, Config};

#[test]
fn parse_complete_config() {
    let toml_content = r#"
[kernel]
version = "5.10.0-custom"
procfs = "/host/proc"

[programs]
force_small = true
force_large = true

[probes]
large_program_size = true
signal_helper = true

[logging]
level = "kernver=debug"
"#;

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("kernver.toml");
    std::fs::write(&config_path, toml_content).expect("write");

    let config = load_config(&config_path).expect("parse config");
    config.validate().expect("valid");

    assert_eq!(config.version_override(), Some("5.10.0-custom"));
    assert_eq!(config.kernel.procfs, PathBuf::from("/host/proc"));
    assert!(config.programs.force_small);
    assert!(config.programs.force_large);
    assert!(config.probes.large_program_size);
    assert!(config.probes.signal_helper);
    assert_eq!(config.logging.level, "kernver=debug");
}

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config(&dir.path().join("absent.toml")).expect("defaults");

    assert!(config.version_override().is_none());
    assert_eq!(config.kernel.procfs, PathBuf::from("/proc"));
    assert!(!config.programs.force_small);
}

#[test]
fn partial_config_keeps_other_defaults() {
    let config = Config::from_toml("[programs]\nforce_large = true\n").expect("parse");

    assert!(config.programs.force_large);
    assert!(!config.programs.force_small);
    assert_eq!(config.kernel.procfs, PathBuf::from("/proc"));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("kernver.toml");
    std::fs::write(&config_path, "[kernel\nversion = 5").expect("write");

    let err = load_config(&config_path).expect_err("should fail");
    assert!(err.to_string().contains("kernver.toml"));
}

#[test]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("kernver.toml");
    std::fs::write(
        &config_path,
        "[kernel]\nversion = \"4.19.0\"\n[programs]\nforce_large = true\n",
    )
    .expect("write");

    let config = load_with_env(&config_path, |key| match key {
        "KERNVER_KERNEL_VERSION" => Some("6.1.0".to_owned()),
        "KERNVER_PROCFS" => Some("/host/proc".to_owned()),
        "KERNVER_FORCE_LARGE_PROGS" => Some("false".to_owned()),
        _ => None,
    })
    .expect("load");

    assert_eq!(config.version_override(), Some("6.1.0"));
    assert_eq!(config.kernel.procfs, PathBuf::from("/host/proc"));
    assert!(!config.programs.force_large);
}

#[test]
fn validate_rejects_empty_procfs() {
    let mut config = Config::default();
    config.kernel.procfs = PathBuf::new();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_bad_log_level() {
    let mut config = Config::default();
    config.logging.level = "kernver=notalevel".to_owned();
    assert!(config.validate().is_err());
}
