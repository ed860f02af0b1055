//! Error types for tag store operations.

use std::io;

/// Errors reported by a tag store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The resource is unknown to the store.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The backend refused the request.
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shared store state was poisoned by a panicking caller.
    #[error("Store state poisoned")]
    Poisoned,
}

impl StoreError {
    /// Create a rejection error.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }
}
