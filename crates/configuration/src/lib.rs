use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DisplayConfig, EndpointConfig, LoggingConfig, OutputFormat, RegistryConfig,
};

/// Prefix for environment overrides, e.g. `NONPROFIT_LENS__REGISTRY__TIMEOUT=30s`.
pub const ENV_PREFIX: &str = "NONPROFIT_LENS";

/// Loads the application configuration.
///
/// Reads `config.toml` from the working directory if it exists (or `path`, which
/// must exist when given), overlays `NONPROFIT_LENS__*` environment variables,
/// deserializes the result into our strongly-typed `Config` struct and validates it.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

    finish(builder)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
