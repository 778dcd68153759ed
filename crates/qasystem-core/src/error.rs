//! Error types for qasystem

use thiserror::Error;

/// Result type alias using QaError
pub type Result<T> = std::result::Result<T, QaError>;

/// Error type alias for convenience
pub type Error = QaError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNAVAILABLE: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for qasystem
#[derive(Debug, Error)]
pub enum QaError {
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Deadline exceeded after {0} seconds")]
    DeadlineExceeded(u64),

    #[error("Malformed frame: {0}")]
    Frame(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl QaError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmbeddingUnavailable(_)
            | Self::RetrievalUnavailable(_)
            | Self::GenerationFailure(_)
            | Self::DeadlineExceeded(_)
            | Self::Http(_) => exit_codes::UNAVAILABLE,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether the error is caused by a downstream collaborator rather than the caller
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable(_)
                | Self::RetrievalUnavailable(_)
                | Self::GenerationFailure(_)
                | Self::Http(_)
        )
    }
}
