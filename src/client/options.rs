//! Request and response envelopes.

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::client::cancel::CancelToken;
use crate::client::decode::DecodedBody;

/// Per-request options layered over the client configuration.
///
/// Every field is optional; unset overrides fall back to the
/// `ClientConfig` the client was constructed with.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Override the configured cache toggle for this request.
    pub cache_enabled: Option<bool>,

    /// Entry-specific TTL in milliseconds.
    pub cache_ttl_ms: Option<u64>,

    /// Explicit cache key, replacing the canonical URL + params key.
    pub cache_key: Option<String>,

    /// Override the configured transport deadline in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Override the configured retry allowance.
    pub retry_limit: Option<u32>,

    /// JSON-encodable request parameters; these feed cache key
    /// generation so logically equal requests share an entry.
    pub params: BTreeMap<String, Value>,

    /// Extra request headers.
    pub headers: HeaderMap,

    /// Request body for non-GET verbs.
    pub body: Option<Bytes>,

    /// Cooperative cancellation for this request.
    pub cancel: Option<CancelToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    pub fn without_cache(self) -> Self {
        self.with_cache(false)
    }

    pub fn with_cache_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.cache_ttl_ms = Some(ttl_ms);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_retry_limit(mut self, retries: u32) -> Self {
        self.retry_limit = Some(retries);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A request as seen by the before-request hook, ahead of the cache
/// check. Hooks may rewrite any part of it.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
}

/// Response envelope returned by the pipeline.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: DecodedBody,
    /// Whether the body was served from the response cache.
    pub from_cache: bool,
    /// URL the payload was ultimately read from, after redirects.
    pub final_url: String,
}
