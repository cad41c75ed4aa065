use thiserror::Error;

/// Failures while assembling settings from `config.toml` and the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read, or its values do not fit the settings types.
    #[error("Could not read settings from the config file or NONPROFIT_LENS__* variables: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    ValidationError(String),
}
