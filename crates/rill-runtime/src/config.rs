//! Configuration loading for the Rill runtime.
//!
//! Layered loading via figment, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. `rill.toml` (or a file passed to [`ConfigLoader::file`])
//! 3. Environment variables (`RILL_*`, `__` as section separator)
//! 4. Programmatic overrides via [`ConfigLoader::merge`]
//!
//! # Environment Variable Mapping
//!
//! - `RILL_BROKER__GROUP_ID=group_1` → `broker.group_id = "group_1"`
//! - `RILL_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use rill_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//!
//! let config = ConfigLoader::new()
//!     .file("config/production.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name searched in the current directory.
const DEFAULT_CONFIG_FILE: &str = "rill.toml";

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or merging configuration sources failed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// A loaded value is invalid.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RillConfig {
    /// Broker client settings, passed through to the concrete client.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RillConfig {
    /// Validates loaded values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.broker.bootstrap_servers.is_empty() {
            return Err(ConfigError::Validation(
                "broker.bootstrap_servers must not be empty".to_string(),
            ));
        }
        if self.broker.group_id.is_empty() {
            return Err(ConfigError::Validation(
                "broker.group_id must not be empty".to_string(),
            ));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// Broker client settings.
///
/// The framework itself only logs these; the host process uses them to
/// build whatever concrete [`BrokerConsumer`](rill_core::BrokerConsumer)
/// it wires in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Initial broker addresses, comma separated.
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Consumer group identifier.
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Where a fresh group starts reading ("earliest" or "latest").
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,

    /// Whether the client commits offsets automatically. The framework
    /// performs no commit of its own either way.
    #[serde(default)]
    pub enable_auto_commit: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            enable_auto_commit: false,
        }
    }
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_group_id() -> String {
    "rill".to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output.
    #[default]
    Compact,
    /// Standard multi-field output.
    Full,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include thread IDs in output.
    #[serde(default)]
    pub thread_ids: bool,

    /// Extra filter directives, e.g. `rill_runtime=debug`.
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            thread_ids: false,
            directives: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
    overrides: Option<RillConfig>,
}

impl ConfigLoader {
    /// Creates a loader with the default search behavior
    /// (`rill.toml` in the current directory, then `RILL_*` env vars).
    pub fn new() -> Self {
        Self {
            file: None,
            use_env: true,
            overrides: None,
        }
    }

    /// Sets a specific configuration file to load instead of the
    /// default `rill.toml`.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables the environment-variable layer.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Merges programmatic overrides on top of all other sources.
    pub fn merge(mut self, config: RillConfig) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<RillConfig> {
        let mut figment = Figment::from(Serialized::defaults(RillConfig::default()));

        match &self.file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed("RILL_").split("__"));
        }

        if let Some(overrides) = self.overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: RillConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<RillConfig> {
    ConfigLoader::new().load()
}
