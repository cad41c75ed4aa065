use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Filing is not a well-formed record: expected a JSON object, found {0}")]
    MalformedFiling(String),

    #[error("Unknown filing field: {0}")]
    UnknownField(String),
}
