//! Error taxonomy for the cache core.
//!
//! The core never maps these to status codes; that is the transport's job
//! (see `http::response`).

use thiserror::Error;

use crate::routing::handler::BoxError;

/// Errors surfaced by registration and request dispatch.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A request path segment is not validly percent-encoded.
    #[error("malformed path segment: {segment:?}")]
    DecodeFailed { segment: String },

    /// A route pattern could not be decoded at registration time.
    #[error("invalid route pattern: {pattern:?}")]
    InvalidPattern { pattern: String },

    /// Lookup reached a node with no registered handler.
    #[error("no handler registered for {path}")]
    NotFound { path: String },

    /// The handler failed while populating an entry for the first time.
    #[error("handler failed for {key}: {source}")]
    HandlerFailed {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The entry exists but holds no value yet; another request is populating it.
    #[error("cache entry for {key} found, but no value stored, try again later")]
    CacheEmpty { key: String },
}

impl CacheError {
    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::CacheEmpty { .. })
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
