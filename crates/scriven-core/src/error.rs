//! Error types for the Scriven knowledge base and synthesis engine.

use thiserror::Error;
use uuid::Uuid;

use crate::models::DocumentStatus;

/// Result type alias using Scriven's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for knowledge-base and synthesis operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Knowledge or generated document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Media kind is not supported by any extractor (terminal, no retry)
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Extraction exceeded its deadline (retryable with backoff)
    #[error("Extraction timed out: {0}")]
    ExtractionTimeout(String),

    /// Extraction failed after exhausting retries (terminal)
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Per-tenant storage ceiling crossed
    #[error("Storage quota exceeded: {used_bytes} of {limit_bytes} bytes used")]
    QuotaExceeded { used_bytes: i64, limit_bytes: i64 },

    /// A synthesis source id does not resolve to a known document
    #[error("Unknown synthesis source: {0}")]
    UnknownSource(Uuid),

    /// Synthesis prompt was empty or whitespace
    #[error("Synthesis prompt must not be empty")]
    EmptyPrompt,

    /// Disallowed lifecycle status transition
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Generative provider unreachable after bounded retries
    #[error("Synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// Stale-version update rejected by optimistic concurrency
    #[error("Concurrent modification of document: {0}")]
    ConcurrentModification(Uuid),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

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

impl Error {
    /// Transient infrastructure errors that warrant bounded retry/backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ExtractionTimeout(_) | Error::SynthesisUnavailable(_) | Error::Request(_)
        )
    }

    /// Caller mistakes: returned immediately, never retried automatically.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownSource(_)
                | Error::EmptyPrompt
                | Error::InvalidTransition { .. }
                | Error::InvalidInput(_)
        )
    }
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
