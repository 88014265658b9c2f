// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! Configuration files on disk in every supported format, placeholders,
//! environment overrides and the values handed to the runtime.
//!
//! Environment tests use distinct prefixes so they can run in parallel.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use hart_config::{
    load_config, CadenceKind, ConfigError, ConfigFormat, ConfigLoader, HartConfig,
};
use hart_core::{CadencePolicy, CommandKind, FailurePolicy, SnapshotShape};

use hart_tests::common::{temp_test_dir, ConfigFixtures};

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config file");
    path
}

fn assert_fixture(config: &HartConfig) {
    assert_eq!(config.device.port, "/dev/ttyUSB3");
    assert_eq!(config.device.simulator.tag, "PT-200");
    assert_eq!(config.device.simulator.seed, Some(42));
    assert_eq!(config.poller.cadence, CadenceKind::FixedDelay);
    assert_eq!(config.poller.interval_ms, 500);
    assert_eq!(config.poller.failure_policy, FailurePolicy::FailFast);
    assert_eq!(config.poller.commands, vec![1, 2, 3]);
    assert_eq!(config.api.socket_addr().to_string(), "127.0.0.1:9100");
    assert_eq!(config.api.snapshot, SnapshotShape::Device);
    assert_eq!(config.metrics.namespace, "plant_a");
}

// =============================================================================
// Format Tests
// =============================================================================

#[test]
fn test_load_yaml_file() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.yaml", ConfigFixtures::yaml());
    assert_fixture(&load_config(&path).unwrap());
}

#[test]
fn test_load_toml_file() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.toml", ConfigFixtures::toml());
    assert_fixture(&load_config(&path).unwrap());
}

#[test]
fn test_load_json_file() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.json", ConfigFixtures::json());
    assert_fixture(&load_config(&path).unwrap());
}

#[test]
fn test_formats_agree() {
    let loader = ConfigLoader::new().with_env_vars(false);
    let yaml = loader
        .load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml)
        .unwrap();
    let toml = loader
        .load_from_str(ConfigFixtures::toml(), ConfigFormat::Toml)
        .unwrap();
    let json = loader
        .load_from_str(ConfigFixtures::json(), ConfigFormat::Json)
        .unwrap();

    let as_json = |c: &HartConfig| serde_json::to_value(c).unwrap();
    assert_eq!(as_json(&yaml), as_json(&toml));
    assert_eq!(as_json(&yaml), as_json(&json));
}

#[test]
fn test_unsupported_extension() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.ini", "[device]");
    assert!(matches!(
        load_config(&path),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_parse_error_names_file() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.toml", "[poller\ninterval_ms = ");
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("hart.toml"));
}

#[test]
fn test_unknown_field_rejected() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.json", r#"{ "poller": { "interval": 100 } }"#);
    assert!(load_config(&path).is_err());
}

// =============================================================================
// Defaults & Validation Tests
// =============================================================================

#[test]
fn test_missing_file_strict_vs_default() {
    let dir = temp_test_dir("hart-config");
    let path = dir.path().join("absent.yaml");

    assert!(matches!(
        load_config(&path),
        Err(ConfigError::FileNotFound { .. })
    ));

    let config = ConfigLoader::new()
        .with_env_prefix("HARTITMISSING")
        .load_or_default(&path)
        .unwrap();
    assert_eq!(config.poller.interval_ms, 2000);
    assert_eq!(config.poller.channel_capacity, 1);
    assert_eq!(config.poller.failure_policy, FailurePolicy::FailSoft);
    assert_eq!(config.api.port, 3333);
}

#[test]
fn test_minimal_yaml_fills_defaults() {
    let config = ConfigLoader::new()
        .with_env_vars(false)
        .load_from_str("device:\n  port: /dev/ttyS0\n", ConfigFormat::Yaml)
        .unwrap();
    assert_eq!(config.device.port, "/dev/ttyS0");
    assert_eq!(config.poller.commands, vec![1, 2, 3, 13, 15]);
    assert_eq!(config.api.snapshot, SnapshotShape::Full);
}

#[test]
fn test_validation_failures() {
    let loader = ConfigLoader::new().with_env_vars(false);
    let load = |body: &str| loader.load_from_str(body, ConfigFormat::Json);

    assert!(matches!(
        load(r#"{ "poller": { "interval_ms": 0 } }"#),
        Err(ConfigError::Validation { .. })
    ));
    assert!(matches!(
        load(r#"{ "poller": { "channel_capacity": 0 } }"#),
        Err(ConfigError::Validation { .. })
    ));
    assert!(matches!(
        load(r#"{ "poller": { "commands": [1, 99] } }"#),
        Err(ConfigError::UnknownCommand { number: 99, .. })
    ));
    assert!(matches!(
        load(r#"{ "api": { "port": 0 } }"#),
        Err(ConfigError::Validation { .. })
    ));
    assert!(matches!(
        load(r#"{ "device": { "simulator": { "fault_rate": 1.5 } } }"#),
        Err(ConfigError::OutOfRange { .. })
    ));
}

#[test]
fn test_runtime_views() {
    let config = ConfigLoader::new()
        .with_env_vars(false)
        .load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(
        config.poller.cadence_policy(),
        CadencePolicy::FixedDelay(Duration::from_millis(500))
    );
    let scheduler = config.poller.scheduler_config();
    assert_eq!(scheduler.failure_policy, FailurePolicy::FailFast);

    let catalog = config.poller.catalog();
    assert_eq!(catalog.identification(), CommandKind::ReadUniqueIdentifier);
    assert_eq!(
        catalog.cycle(),
        &[
            CommandKind::ReadPrimaryVariable,
            CommandKind::ReadLoopCurrentAndPercentOfRange,
            CommandKind::ReadDynamicVariables,
        ]
    );

    let options = config.device.simulator.options();
    assert_eq!(options.tag, "PT-200");
    assert_eq!(options.seed, Some(42));
}

// =============================================================================
// Environment Tests
// =============================================================================

#[test]
fn test_env_placeholders() {
    std::env::set_var("HARTIT_PLACEHOLDER_PORT", "/dev/ttyACM0");
    let yaml = "device:\n  port: ${HARTIT_PLACEHOLDER_PORT}\napi:\n  port: ${HARTIT_UNSET_PORT:9200}\n";

    let config = ConfigLoader::new()
        .with_env_prefix("HARTITPLACEHOLDER")
        .load_from_str(yaml, ConfigFormat::Yaml)
        .unwrap();
    assert_eq!(config.device.port, "/dev/ttyACM0");
    assert_eq!(config.api.port, 9200);
}

#[test]
fn test_env_overrides_file() {
    let dir = temp_test_dir("hart-config");
    let path = write(&dir, "hart.yaml", ConfigFixtures::yaml());

    std::env::set_var("HARTITENV_SERIAL_PORT", "/dev/ttyUSB9");
    std::env::set_var("HARTITENV_API_PORT", "9300");
    std::env::set_var("HARTITENV_POLL_INTERVAL_MS", "750");
    std::env::set_var("HARTITENV_FAILURE_POLICY", "fail-soft");

    let config = ConfigLoader::new()
        .with_env_prefix("HARTITENV")
        .load(&path)
        .unwrap();
    assert_eq!(config.device.port, "/dev/ttyUSB9");
    assert_eq!(config.api.port, 9300);
    assert_eq!(config.poller.interval_ms, 750);
    assert_eq!(config.poller.failure_policy, FailurePolicy::FailSoft);
}

#[test]
fn test_env_override_invalid_value() {
    std::env::set_var("HARTITBAD_API_PORT", "not-a-port");
    let result = ConfigLoader::new()
        .with_env_prefix("HARTITBAD")
        .load_from_str("{}", ConfigFormat::Json);
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}
