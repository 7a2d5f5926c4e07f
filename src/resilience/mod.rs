//! Resilience primitives shared by the request pipeline.

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{is_idempotent, is_retryable_status};
