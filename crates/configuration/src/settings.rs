use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://projects.propublica.org/nonprofits/api/v2";

/// The root configuration structure for the entire application.
///
/// Every section is optional; a missing `config.toml` yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Rejects settings that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "registry.base_url must not be empty".to_string(),
            ));
        }
        if self.registry.endpoints.is_empty() {
            return Err(ConfigError::ValidationError(
                "registry.endpoints must list at least one endpoint".to_string(),
            ));
        }
        if let Some(prefix) = self.registry.endpoints.iter().find_map(|endpoint| match endpoint {
            EndpointConfig::Proxy { prefix } if prefix.trim().is_empty() => Some(prefix),
            _ => None,
        }) {
            return Err(ConfigError::ValidationError(format!(
                "registry proxy endpoint has an empty prefix: {prefix:?}"
            )));
        }
        if self.registry.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "registry.timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contains parameters for talking to the nonprofit registry API.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Root of the registry API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout, e.g. "15s".
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Endpoints tried in order for every request until one succeeds.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

/// One way of reaching the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointConfig {
    /// Request the registry URL as-is.
    Direct,
    /// Request `prefix` followed by the percent-encoded registry URL.
    Proxy { prefix: String },
}

/// Contains parameters for log output.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

// --- Default Implementations ---
// This allows a user to omit any section from their toml
// and still have it work with sensible defaults.

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            endpoints: default_endpoints(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("nonprofit-lens/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![EndpointConfig::Direct]
}

fn default_log_level() -> String {
    "info".to_string()
}
