// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! Loads a [`HartConfig`] from YAML, TOML or JSON, resolves `${VAR}` and
//! `${VAR:default}` placeholders in the raw text, applies `HART_*`
//! environment overrides and validates the result.
//!
//! # Environment overrides
//!
//! ```text
//! HART_SERIAL_PORT=/dev/ttyUSB1
//! HART_API_PORT=9100
//! HART_POLL_INTERVAL_MS=1000
//! HART_FAILURE_POLICY=fail_fast
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hart_core::FailurePolicy;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::HartConfig;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "HART";

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads configuration from files or strings.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    resolve_env_vars: bool,
}

impl ConfigLoader {
    /// Creates a loader with the `HART` prefix and env resolution on.
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables placeholder resolution and overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<HartConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self.parse_content(&content, format, path)?;

        self.finish(&mut config)?;

        info!("Configuration loaded successfully");
        debug!(
            port = %config.device.port,
            engine = config.device.engine.as_str(),
            commands = ?config.poller.commands,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Loads a file, or the defaults when the file does not exist.
    ///
    /// Environment overrides and validation apply in both cases.
    pub fn load_or_default(&self, path: impl AsRef<Path>) -> ConfigResult<HartConfig> {
        let path = path.as_ref();
        if path.exists() {
            return self.load(path);
        }

        warn!(
            "Configuration file {} not found, using defaults",
            path.display()
        );
        let mut config = HartConfig::default();
        self.finish(&mut config)?;
        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<HartConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };
        let mut config = parse_str(&content, format)?;
        self.finish(&mut config)?;
        Ok(config)
    }

    fn finish(&self, config: &mut HartConfig) -> ConfigResult<()> {
        if self.resolve_env_vars {
            self.apply_env_overrides(config)?;
        }
        config.validate()
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<HartConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    fn var(&self, name: &str) -> (String, Option<String>) {
        let key = format!("{}_{}", self.env_prefix, name);
        let value = env::var(&key).ok();
        (key, value)
    }

    /// Applies `<PREFIX>_*` environment overrides.
    fn apply_env_overrides(&self, config: &mut HartConfig) -> ConfigResult<()> {
        if let (_, Some(value)) = self.var("SERIAL_PORT") {
            config.device.port = value;
        }

        if let (key, Some(value)) = self.var("API_PORT") {
            config.api.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(key, "expected valid port number"))?;
        }

        if let (key, Some(value)) = self.var("POLL_INTERVAL_MS") {
            config.poller.interval_ms = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(key, "expected valid number"))?;
        }

        if let (key, Some(value)) = self.var("FAILURE_POLICY") {
            config.poller.failure_policy = parse_failure_policy(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(key, "expected fail_soft or fail_fast")
            })?;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<HartConfig> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// YAML goes through the `config` crate so an empty document maps to defaults.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
///
/// Unset variables without a default are left in place.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut var_content = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            var_content.push(c);
        }

        if !found_close {
            result.push_str("${");
            result.push_str(&var_content);
            continue;
        }

        let (var_name, default_value) = match var_content.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (var_content.as_str(), None),
        };

        match (env::var(var_name), default_value) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", var_name);
                result.push_str(&format!("${{{}}}", var_name));
            }
        }
    }

    result
}

fn parse_failure_policy(value: &str) -> Option<FailurePolicy> {
    match value.to_lowercase().replace('-', "_").as_str() {
        "fail_soft" | "soft" => Some(FailurePolicy::FailSoft),
        "fail_fast" | "fast" => Some(FailurePolicy::FailFast),
        _ => None,
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
///
/// ```no_run
/// use hart_config::loader::load_config;
///
/// let config = load_config("hart.yaml").unwrap();
/// println!("polling {}", config.device.port);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<HartConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<HartConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

/// Returns `hart.yaml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("hart.yaml")
}

// =============================================================================
// Tests
// =============================================================================
