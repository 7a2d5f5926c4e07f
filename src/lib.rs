//! Typed client for tabular datasets published as static files over HTTP.
//!
//! The crate is organized around a single request orchestration pipeline:
//! an in-memory response cache with combined LRU + TTL eviction
//! ([`cache`]), a token-bucket rate limiter with fair queuing
//! ([`limiter`]), and a client that composes both with timeout, retry and
//! cancellation semantics around one logical fetch ([`client`]).
//!
//! Dataset-specific loaders act as collaborators: they hand the client a
//! URL, per-request options and a declared format, and receive a decoded
//! response envelope back. The core never validates domain parameters.

// Core pipeline
pub mod cache;
pub mod client;
pub mod limiter;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use cache::{generate_key, CacheStats, ResponseCache};
pub use client::{
    CancelToken, ContentKind, DatasetFormat, DecodedBody, ErrorKind, FetchError, FetchResult,
    Hooks, HttpResponse, PreparedRequest, RequestClient, RequestOptions, Transport,
};
pub use config::schema::ClientConfig;
pub use limiter::{RateLimiter, RateLimiterStats};
