use thiserror::Error;

/// Failure of a single resolution attempt.
///
/// Every variant is terminal: nothing is retried and no partial stream map is
/// ever returned to the caller.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing or insufficient authentication configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed input URL or a response body that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested game is absent from the week's game list.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A response was well-formed but lacked an expected field.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Transport-level failure, surfaced unchanged from the HTTP layer.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SourceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
