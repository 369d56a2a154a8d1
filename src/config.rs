use crate::cli::Cli;
use crate::diagnostics::{DEFAULT_DELIMITER, ErrorMode};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub errors: ErrorConfig,
    pub runtime: RuntimeConfig,
    pub network: NetworkConfig,
    pub output: OutputConfig,
}

/// Diagnostic collection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ErrorConfig {
    /// Errors kept while parsing the schema and the document
    pub parse_mode: ErrorMode,
    /// Errors kept while validating
    pub validate_mode: ErrorMode,
    /// Separator between reported errors
    pub delimiter: String,
}

/// libxml2 runtime settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Period of native memory reclamation; disabled when unset
    pub reclaim_interval_seconds: Option<u64>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Timeout for fetching remote schemas, in seconds
    pub timeout_seconds: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
    /// Verbose logging
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            parse_mode: ErrorMode::Default,
            validate_mode: ErrorMode::Default,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl RuntimeConfig {
    pub fn reclaim_interval(&self) -> Option<Duration> {
        self.reclaim_interval_seconds.map(Duration::from_secs)
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// Same as [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        // Start with default configuration
        let mut config = Config::default();

        // Load from configuration file if specified
        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        // Apply environment variable overrides
        config = Self::apply_environment_overrides_with(env, config)?;

        // Apply CLI argument overrides (highest precedence)
        config = Self::merge_with_cli(config, cli);

        // Validate the final configuration
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "xsdvalidate.toml",
            "xsdvalidate.json",
            ".xsdvalidate.toml",
            ".xsdvalidate.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("xsdvalidate");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Error settings
        if let Some(mode) = env.get("XSDVALIDATE_PARSE_ERRORS") {
            config.errors.parse_mode = mode.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XSDVALIDATE_PARSE_ERRORS value: {}", mode))
            })?;
        }

        if let Some(mode) = env.get("XSDVALIDATE_VALIDATION_ERRORS") {
            config.errors.validate_mode = mode.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid XSDVALIDATE_VALIDATION_ERRORS value: {}",
                    mode
                ))
            })?;
        }

        if let Some(delimiter) = env.get("XSDVALIDATE_DELIMITER") {
            config.errors.delimiter = delimiter;
        }

        // Runtime settings
        if let Some(interval) = env.get("XSDVALIDATE_RECLAIM_INTERVAL") {
            config.runtime.reclaim_interval_seconds = Some(interval.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid XSDVALIDATE_RECLAIM_INTERVAL value: {}",
                    interval
                ))
            })?);
        }

        // Network settings
        if let Some(timeout) = env.get("XSDVALIDATE_TIMEOUT") {
            config.network.timeout_seconds = timeout.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XSDVALIDATE_TIMEOUT value: {}", timeout))
            })?;
        }

        // Output settings
        if let Some(format) = env.get("XSDVALIDATE_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XSDVALIDATE_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(mode) = cli.parse_errors {
            config.errors.parse_mode = mode;
        }
        if let Some(mode) = cli.validation_errors {
            config.errors.validate_mode = mode;
        }
        if let Some(delimiter) = &cli.delimiter {
            config.errors.delimiter = delimiter.clone();
        }
        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }
        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.errors.delimiter.is_empty() {
            return Err(ConfigError::Validation(
                "Error delimiter must not be empty".to_string(),
            ));
        }

        if let Some(0) = config.runtime.reclaim_interval_seconds {
            return Err(ConfigError::Validation(
                "Reclaim interval must be greater than 0".to_string(),
            ));
        }

        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}
