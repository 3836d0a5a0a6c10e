//! Unified error types for Scribe

use thiserror::Error;

/// Unified error type for all Scribe operations
#[derive(Error, Debug)]
pub enum ScribeError {
    // Sandbox errors
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Path validation failed: {0}")]
    PathValidation(String),

    #[error("Listing failed: {0}")]
    Listing(String),

    // Generation errors
    #[error("Generation service unavailable: {0}")]
    Transient(String),

    #[error("API limit: {0}")]
    ApiLimit(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // Memory errors
    #[error("Memory store error: {0}")]
    Memory(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl ScribeError {
    /// Whether the failure is network/service-unavailable class
    ///
    /// Transient failures are expected to clear on their own; everything else
    /// is treated as unexpected. Both are absorbed by the work unit, but they
    /// are reported differently.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScribeError::Transient(_) | ScribeError::ApiLimit(_))
    }
}

impl From<std::io::Error> for ScribeError {
    fn from(e: std::io::Error) -> Self {
        ScribeError::Io(e.to_string())
    }
}

/// Result type alias using ScribeError
pub type Result<T> = std::result::Result<T, ScribeError>;
