//! Request throttling subsystem.

pub mod token_bucket;

pub use token_bucket::{RateLimiter, RateLimiterStats};
