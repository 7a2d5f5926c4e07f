//! Retry classification.
//!
//! # Responsibilities
//! - Decide which HTTP statuses are transient (allow-list)
//! - Decide which methods are idempotent, gating cache use and retry
//!
//! # Design Decisions
//! - Only 408, 429 and 5xx retry; other client errors fail fast
//! - Network-level failures and timeouts are always considered transient
//! - Cancellation is never retried

use reqwest::{Method, StatusCode};

/// Transient-condition allow-list for HTTP status codes.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Idempotent methods are safe to serve from cache and to retry.
pub fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}
