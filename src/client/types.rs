//! Client error taxonomy.

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error preserved as the cause of a classified failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the request pipeline.
///
/// Failures are scoped to the request that produced them; a shared client
/// remains usable after any number of individual failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure, or an HTTP error status once retry
    /// handling is exhausted. The original cause is preserved when one
    /// exists.
    #[error("network error fetching {url}")]
    Network {
        url: String,
        /// Set when the failure was an error response rather than a
        /// broken transport.
        status: Option<StatusCode>,
        #[source]
        source: Option<BoxError>,
    },

    /// The transport phase exceeded its deadline.
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        url: String,
        timeout_ms: u64,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's cancellation token fired while the request was in
    /// flight or queued.
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },

    /// Reserved for explicit server-side throttling signals. HTTP 429
    /// currently retries and, when exhausted, surfaces as
    /// [`FetchError::Network`] carrying the status.
    #[error("rate limited fetching {url}")]
    RateLimited { url: String },
}

/// Classification of a [`FetchError`], for dispatch without matching on
/// variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Cancelled,
    RateLimited,
}

impl FetchError {
    /// The classified failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::Cancelled { .. } => ErrorKind::Cancelled,
            FetchError::RateLimited { .. } => ErrorKind::RateLimited,
        }
    }

    /// The URL the failing request addressed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Cancelled { url }
            | FetchError::RateLimited { url } => url,
        }
    }

    /// HTTP status attached to the failure, when there was a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type FetchResult<T> = Result<T, FetchError>;
