//! Error types for Pulse.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! provider, retrieval, routing and synthesis failures. Retrieval-layer
//! variants are normally absorbed by the leaf that raised them; routing and
//! synthesis variants always reach the caller.

use thiserror::Error;

/// Unified error type for Pulse.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider transport or protocol errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding and vector index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The router's model output was not one of the known category tokens
    #[error("Routing ambiguous: model answered {0:?}")]
    RoutingAmbiguous(String),

    /// The static knowledge index is missing or unreachable
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The live news source returned a non-success status or failed in transport
    #[error("Live fetch failed: {0}")]
    LiveFetchFailed(String),

    /// The answer completion failed or came back empty
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Caller supplied unusable input (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An outbound call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a failed outbound call may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::Timeout(_))
    }

    /// Whether this error came from a cancellation token firing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
