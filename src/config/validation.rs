//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, non-empty cache)
//! - Reject limiter settings that could never grant a token
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic violation in a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.request_ms must be at least 1")]
    ZeroRequestTimeout,

    #[error("cache.max_entries must be at least 1")]
    ZeroCacheCapacity,

    #[error("rate_limit.max_requests must be at least 1")]
    ZeroRateLimitCapacity,

    #[error("rate_limit.interval_ms must be at least 1")]
    ZeroRateLimitInterval,

    #[error("retries.base_delay_ms must not exceed retries.max_delay_ms")]
    BackoffRangeInverted,
}

/// Check a configuration for semantic violations, collecting every error.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::ZeroRateLimitCapacity);
        }
        if config.rate_limit.interval_ms == 0 {
            errors.push(ValidationError::ZeroRateLimitInterval);
        }
    }

    if config.retries.enabled && config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::BackoffRangeInverted);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
