//! Request orchestration pipeline.
//!
//! One logical fetch walks cache check → rate gate → transport (with
//! timeout and retry) → decode → cache store → hook dispatch. Cache hits
//! return without touching the limiter or the network, so a hit can
//! overtake an earlier still-in-flight request for the same URL.
//!
//! A single client instance is shared across many concurrent logical
//! requests; the cache and limiter guard their own invariants, and no
//! operation spans more than one of them atomically.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, ETAG, LAST_MODIFIED};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::{generate_key, CacheStats, ResponseCache};
use crate::client::cancel::CancelToken;
use crate::client::decode::{self, ContentKind, DecodedBody};
use crate::client::hooks::Hooks;
use crate::client::options::{HttpResponse, PreparedRequest, RequestOptions};
use crate::client::transport::{
    RawResponse, ReqwestTransport, Transport, TransportError, TransportRequest,
};
use crate::client::types::{BoxError, FetchError, FetchResult};
use crate::config::schema::ClientConfig;
use crate::limiter::{RateLimiter, RateLimiterStats};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::retries::{is_idempotent, is_retryable_status};

/// Orchestrates one logical request at a time per call, any number of
/// calls concurrently.
pub struct RequestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: ResponseCache<DecodedBody>,
    limiter: Option<RateLimiter>,
    hooks: RwLock<Hooks>,
}

impl RequestClient {
    /// Create a client backed by the default reqwest transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client with an injected transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = ResponseCache::new(
            config.cache.max_entries,
            Duration::from_millis(config.cache.ttl_ms),
        );
        let limiter = config.rate_limit.enabled.then(|| {
            RateLimiter::new(
                config.rate_limit.max_requests,
                Duration::from_millis(config.rate_limit.interval_ms),
            )
        });

        Self {
            config,
            transport,
            cache,
            limiter,
            hooks: RwLock::new(Hooks::default()),
        }
    }

    /// Replace the installed hook set.
    pub fn set_hooks(&self, hooks: Hooks) {
        *self.hooks.write().expect("hooks lock poisoned") = hooks;
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> FetchResult<HttpResponse> {
        self.request(Method::GET, url, options).await
    }

    pub async fn head(&self, url: &str, options: RequestOptions) -> FetchResult<HttpResponse> {
        self.request(Method::HEAD, url, options).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> FetchResult<HttpResponse> {
        self.request(Method::POST, url, options).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> FetchResult<HttpResponse> {
        self.request(Method::PUT, url, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> FetchResult<HttpResponse> {
        self.request(Method::DELETE, url, options).await
    }

    /// Run one logical request through the pipeline.
    ///
    /// The error path invokes the on-error hook exactly once with the
    /// classified failure and the original URL, then re-raises it.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> FetchResult<HttpResponse> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("fetch", %request_id, %method, url);
        let started = Instant::now();

        let hooks = self.hooks();
        let result = self
            .run_pipeline(&hooks, method, url, options)
            .instrument(span)
            .await;

        metrics::record_request_duration(started.elapsed().as_secs_f64());
        match &result {
            Ok(response) => {
                metrics::record_request(if response.from_cache { "cache_hit" } else { "ok" });
            }
            Err(error) => {
                metrics::record_request("error");
                tracing::warn!(error = %error, url, "request failed");
                if let Some(on_error) = &hooks.on_error {
                    on_error(error, url).await;
                }
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        hooks: &Hooks,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> FetchResult<HttpResponse> {
        let mut prepared = PreparedRequest {
            method,
            url: url.to_string(),
            options,
        };
        if let Some(before) = &hooks.before_request {
            prepared = before(prepared).await;
        }
        let PreparedRequest {
            method,
            url,
            options,
        } = prepared;

        // CacheCheck
        let cache_enabled = options.cache_enabled.unwrap_or(self.config.cache.enabled);
        let cacheable = cache_enabled && is_idempotent(&method);
        let cache_key = cacheable.then(|| {
            options
                .cache_key
                .clone()
                .unwrap_or_else(|| generate_key(&url, &options.params))
        });

        if let Some(key) = &cache_key {
            if let Some(body) = self.cache.get(key) {
                tracing::debug!(key = %key, "serving response from cache");
                let mut response = HttpResponse {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body,
                    from_cache: true,
                    final_url: url.clone(),
                };
                if let Some(after) = &hooks.after_response {
                    response = after(response).await;
                }
                return Ok(response);
            }
        }

        let cancel = options.cancel.clone().unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { url });
        }

        // RateGate: suspends this request only; dropping the acquire
        // future on cancellation removes us from the wait queue.
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                _ = limiter.acquire() => {}
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url });
                }
            }
        }

        // Transport
        let raw = self
            .execute_with_retry(&method, &url, &options, &cancel)
            .await?;

        // Decode
        let kind = ContentKind::from_headers(&raw.headers);
        let body = decode::decode(kind, raw.body.clone()).map_err(|error| FetchError::Network {
            url: url.clone(),
            status: Some(raw.status),
            source: Some(Box::new(error)),
        })?;

        // CacheStore
        if let Some(key) = &cache_key {
            if raw.status.is_success() {
                let ttl = options.cache_ttl_ms.map(Duration::from_millis);
                let etag = header_string(&raw.headers, ETAG);
                let last_modified = header_string(&raw.headers, LAST_MODIFIED);
                self.cache.set(key, body.clone(), ttl, etag, last_modified);
            }
        }

        // HookDispatch
        let mut response = HttpResponse {
            status: raw.status,
            headers: raw.headers,
            body,
            from_cache: false,
            final_url: raw.final_url,
        };
        if let Some(after) = &hooks.after_response {
            response = after(response).await;
        }
        Ok(response)
    }

    async fn execute_with_retry(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        cancel: &CancelToken,
    ) -> FetchResult<RawResponse> {
        let timeout_ms = options.timeout_ms.unwrap_or(self.config.timeouts.request_ms);
        let deadline = Duration::from_millis(timeout_ms);
        let retry_limit = if self.config.retries.enabled {
            options.retry_limit.unwrap_or(self.config.retries.max_retries)
        } else {
            0
        };
        let base_delay = Duration::from_millis(self.config.retries.base_delay_ms);
        let max_delay = Duration::from_millis(self.config.retries.max_delay_ms);

        let request = TransportRequest {
            method: method.clone(),
            url: url.to_string(),
            headers: options.headers.clone(),
            body: options.body.clone(),
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url: url.to_string() });
                }
                outcome = tokio::time::timeout(deadline, self.transport.execute(&request)) => outcome,
            };

            let failure = match outcome {
                Ok(Ok(raw)) if raw.status.is_success() => return Ok(raw),
                Ok(Ok(raw)) => AttemptError::Status(raw.status),
                Ok(Err(error @ TransportError::TimedOut)) => {
                    AttemptError::Timeout(Some(Box::new(error)))
                }
                Ok(Err(error)) => AttemptError::Transport(error),
                Err(elapsed) => AttemptError::Timeout(Some(Box::new(elapsed))),
            };

            let retryable = match &failure {
                AttemptError::Status(status) => is_retryable_status(*status),
                AttemptError::Transport(_) | AttemptError::Timeout(_) => true,
            };

            if retryable && attempt <= retry_limit {
                tracing::warn!(error = %failure, attempt, url, "transient failure, retrying");
                metrics::record_retry();
                let delay = calculate_backoff(attempt, base_delay, max_delay);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        return Err(FetchError::Cancelled { url: url.to_string() });
                    }
                }
                continue;
            }

            return Err(match failure {
                AttemptError::Status(status) => FetchError::Network {
                    url: url.to_string(),
                    status: Some(status),
                    source: None,
                },
                AttemptError::Transport(error) => FetchError::Network {
                    url: url.to_string(),
                    status: None,
                    source: Some(Box::new(error)),
                },
                AttemptError::Timeout(source) => FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms,
                    source,
                },
            });
        }
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache occupancy snapshot.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Eagerly sweep expired cache entries; returns the number removed.
    pub fn evict_expired_cache(&self) -> usize {
        self.cache.evict_expired()
    }

    /// Limiter snapshot, absent when this client has no limiter.
    pub fn rate_limiter_stats(&self) -> Option<RateLimiterStats> {
        self.limiter.as_ref().map(RateLimiter::stats)
    }

    /// Reset the limiter to a full bucket; false when none is configured.
    pub fn reset_rate_limiter(&self) -> bool {
        match &self.limiter {
            Some(limiter) => {
                limiter.reset();
                true
            }
            None => false,
        }
    }

    fn hooks(&self) -> Hooks {
        self.hooks.read().expect("hooks lock poisoned").clone()
    }
}

impl std::fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClient")
            .field("timeout_ms", &self.config.timeouts.request_ms)
            .field("cache_enabled", &self.config.cache.enabled)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

/// One failed transport attempt, before it is either retried or
/// classified into the public taxonomy.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(TransportError),
    #[error("deadline exceeded")]
    Timeout(Option<BoxError>),
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
