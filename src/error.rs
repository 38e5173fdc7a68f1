//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Fetch Error Enum ==
/// Unified error type for cached fetch operations.
///
/// Every variant is cheap to clone so that all callers joined on one
/// in-flight request can receive the same failure. Errors are never written
/// into the cache store, so a failing endpoint cannot poison later hits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} {status_text} for {url}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Canonical status text
        status_text: String,
        /// URL of the failed request
        url: String,
    },

    /// Transport-level failure (DNS, connection refused, timeout)
    #[error("network failure for {url}: {message}")]
    Network {
        /// URL of the failed request
        url: String,
        /// Underlying transport error description
        message: String,
    },

    /// Response body was not valid JSON, or did not match the requested type
    #[error("invalid JSON from {url}: {message}")]
    Serialization {
        /// URL of the failed request
        url: String,
        /// Underlying decode error description
        message: String,
    },
}

impl FetchError {
    /// Returns the HTTP status code for `Http` errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL of the request that produced this error.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Network { url, .. }
            | FetchError::Serialization { url, .. } => url,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch cache.
pub type Result<T> = std::result::Result<T, FetchError>;
