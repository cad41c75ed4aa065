use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// The input could not be read as a filing at all.
    #[error("Computation error: {0}")]
    Computation(#[from] core_types::CoreError),
}
