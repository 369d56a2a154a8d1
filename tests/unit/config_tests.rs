use std::time::Duration;

use clap::Parser;
use tempfile::TempDir;

use xsdvalidate::config::ConfigError;
use xsdvalidate::{Cli, Config, ConfigManager, ErrorMode, OutputFormat};

use crate::common::mocks::{MockEnv, mock_env};

#[tokio::test]
async fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.errors.parse_mode, ErrorMode::Default);
    assert_eq!(config.errors.validate_mode, ErrorMode::Default);
    assert_eq!(config.errors.delimiter, ";");
    assert_eq!(config.runtime.reclaim_interval(), None);
    assert_eq!(config.network.timeout_seconds, 30);
    assert_eq!(config.output.format, OutputFormat::Human);
    assert!(ConfigManager::validate_config(&config).is_ok());
}

#[tokio::test]
async fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsdvalidate.toml");
    tokio::fs::write(
        &path,
        r#"
[errors]
parse_mode = "verbose"
delimiter = " | "

[runtime]
reclaim_interval_seconds = 60

[output]
format = "json"
"#,
    )
    .await
    .unwrap();

    let config = ConfigManager::load_from_file(&path).await.unwrap();
    assert_eq!(config.errors.parse_mode, ErrorMode::Verbose);
    assert_eq!(config.errors.validate_mode, ErrorMode::Default);
    assert_eq!(config.errors.delimiter, " | ");
    assert_eq!(config.runtime.reclaim_interval(), Some(Duration::from_secs(60)));
    assert_eq!(config.output.format, OutputFormat::Json);
    // Untouched sections keep their defaults
    assert_eq!(config.network.timeout_seconds, 30);
}

#[tokio::test]
async fn test_load_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsdvalidate.json");
    tokio::fs::write(
        &path,
        r#"{ "errors": { "validate_mode": "verbose" }, "network": { "timeout_seconds": 5 } }"#,
    )
    .await
    .unwrap();

    let config = ConfigManager::load_from_file(&path).await.unwrap();
    assert_eq!(config.errors.validate_mode, ErrorMode::Verbose);
    assert_eq!(config.network.timeout_seconds, 5);
}

#[tokio::test]
async fn test_unsupported_config_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsdvalidate.yaml");
    tokio::fs::write(&path, "errors: {}").await.unwrap();

    match ConfigManager::load_from_file(&path).await {
        Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
        other => panic!("Expected unsupported format, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_config_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    assert!(matches!(
        ConfigManager::load_from_file(&path).await,
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_environment_overrides() {
    let env = mock_env(&[
        ("XSDVALIDATE_PARSE_ERRORS", "verbose"),
        ("XSDVALIDATE_VALIDATION_ERRORS", "VERBOSE"),
        ("XSDVALIDATE_DELIMITER", "\n"),
        ("XSDVALIDATE_RECLAIM_INTERVAL", "120"),
        ("XSDVALIDATE_TIMEOUT", "10"),
        ("XSDVALIDATE_FORMAT", "json"),
    ]);

    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();
    assert_eq!(config.errors.parse_mode, ErrorMode::Verbose);
    assert_eq!(config.errors.validate_mode, ErrorMode::Verbose);
    assert_eq!(config.errors.delimiter, "\n");
    assert_eq!(config.runtime.reclaim_interval_seconds, Some(120));
    assert_eq!(config.network.timeout_seconds, 10);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_invalid_environment_value() {
    let env = mock_env(&[("XSDVALIDATE_TIMEOUT", "soon")]);

    match ConfigManager::apply_environment_overrides_with(&env, Config::default()) {
        Err(ConfigError::Environment(message)) => assert!(message.contains("XSDVALIDATE_TIMEOUT")),
        other => panic!("Expected environment error, got {:?}", other),
    }
}

#[test]
fn test_environment_lookups() {
    let mut env = MockEnv::new();
    env.expect_get()
        .withf(|key| key.starts_with("XSDVALIDATE_"))
        .times(6)
        .returning(|_| None);

    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();
    assert_eq!(config, Config::default());
}

#[tokio::test]
async fn test_cli_takes_precedence_over_environment() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsdvalidate.toml");
    tokio::fs::write(&path, "[errors]\ndelimiter = \",\"\n").await.unwrap();

    let cli = Cli::try_parse_from([
        "validatexml-xsd",
        "-v",
        "-s",
        "schema.xsd",
        "-c",
        path.to_str().unwrap(),
        "--validation-errors",
        "default",
        "--format",
        "human",
    ])
    .unwrap();
    let env = mock_env(&[
        ("XSDVALIDATE_VALIDATION_ERRORS", "verbose"),
        ("XSDVALIDATE_FORMAT", "json"),
        ("XSDVALIDATE_PARSE_ERRORS", "verbose"),
    ]);

    let config = ConfigManager::load_config_with(&cli, &env).await.unwrap();
    assert_eq!(config.errors.delimiter, ",");
    assert_eq!(config.errors.validate_mode, ErrorMode::Default);
    assert_eq!(config.errors.parse_mode, ErrorMode::Verbose);
    assert_eq!(config.output.format, OutputFormat::Human);
}

#[test]
fn test_validate_config_rejects_bad_values() {
    let mut config = Config::default();
    config.errors.delimiter.clear();
    assert!(ConfigManager::validate_config(&config).is_err());

    let mut config = Config::default();
    config.runtime.reclaim_interval_seconds = Some(0);
    assert!(ConfigManager::validate_config(&config).is_err());

    let mut config = Config::default();
    config.network.timeout_seconds = 0;
    assert!(ConfigManager::validate_config(&config).is_err());

    let mut config = Config::default();
    config.output.verbose = true;
    config.output.quiet = true;
    assert!(ConfigManager::validate_config(&config).is_err());
}
