//! Error types for the CHAGOK evidence pipeline.

use thiserror::Error;

/// Result type alias using chagok's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for chagok operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Case not found
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    /// Evidence record not found
    #[error("Evidence not found: {0}")]
    EvidenceNotFound(String),

    /// Authentication failed (missing or invalid credentials)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not a member of the case
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Operation conflicts with current state (e.g. case already closed)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Object key did not match any known shape
    #[error("Invalid object key: {0}")]
    InvalidObjectKey(String),

    /// File extension maps to no parser
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Evidence status transition violates the state machine
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Vector index operation failed
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// True if the caller may safely retry the operation.
    ///
    /// Only transient downstream failures qualify; validation, auth, and
    /// state-machine errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Request(_) | Error::Inference(_) | Error::Embedding(_) | Error::Index(_)
        )
    }
}
