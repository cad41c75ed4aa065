use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Search term must not be empty")]
    EmptySearchTerm,

    #[error("Organization identifier must not be empty")]
    EmptyIdentifier,

    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("All {attempts} registry endpoint(s) failed; last error: {last_error}")]
    Exhausted { attempts: usize, last_error: String },

    #[error("Invalid response format from API: {0}")]
    InvalidResponse(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("No organization found for identifier {0}")]
    NotFound(String),
}

impl ApiError {
    /// True for the one failure that means "the registry has no such record"
    /// rather than "the registry could not be read".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
