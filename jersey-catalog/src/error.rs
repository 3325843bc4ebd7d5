//! Error types for catalog operations
//!
//! Transport and query failures from the remote store propagate to callers
//! unchanged. Malformed cache content never surfaces here: the cache store
//! logs it and treats it as a miss.

use thiserror::Error;

/// Main error type for catalog data access
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Network or availability failure talking to the remote store
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store answered with a non-success status
    #[error("Query failed with status {status}: {message}")]
    Query { status: u16, message: String },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied an invalid page request
    #[error("Invalid catalog query: {0}")]
    InvalidQuery(String),

    /// Persisted cache tier could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// True for failures caused by the remote store being unreachable or failing
    pub fn is_remote(&self) -> bool {
        matches!(self, CatalogError::Transport(_) | CatalogError::Query { .. })
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => CatalogError::Query {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None if e.is_decode() => CatalogError::Serialization(e.to_string()),
            None => CatalogError::Transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Storage(e.to_string())
    }
}
