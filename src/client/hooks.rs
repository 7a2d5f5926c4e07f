//! Request lifecycle hooks.
//!
//! Three independently-nullable capability slots invoked at fixed
//! pipeline points, installed through `RequestClient::set_hooks`.
//! Before-request and after-response own their value and may replace it;
//! on-error observes the classified failure and the original URL.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::client::options::{HttpResponse, PreparedRequest};
use crate::client::types::FetchError;

/// Runs ahead of the cache check; may rewrite the request.
pub type BeforeRequestHook =
    Arc<dyn Fn(PreparedRequest) -> BoxFuture<'static, PreparedRequest> + Send + Sync>;

/// Runs on both the cache-hit and network paths; may replace the
/// response.
pub type AfterResponseHook =
    Arc<dyn Fn(HttpResponse) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// Runs exactly once per failed request.
pub type OnErrorHook =
    Arc<dyn for<'a> Fn(&'a FetchError, &'a str) -> BoxFuture<'a, ()> + Send + Sync>;

/// Hook set for one client instance.
#[derive(Clone, Default)]
pub struct Hooks {
    pub before_request: Option<BeforeRequestHook>,
    pub after_response: Option<AfterResponseHook>,
    pub on_error: Option<OnErrorHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(PreparedRequest) -> BoxFuture<'static, PreparedRequest> + Send + Sync + 'static,
    {
        self.before_request = Some(Arc::new(hook));
        self
    }

    pub fn on_after_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(HttpResponse) -> BoxFuture<'static, HttpResponse> + Send + Sync + 'static,
    {
        self.after_response = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a FetchError, &'a str) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_request", &self.before_request.is_some())
            .field("after_response", &self.after_response.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
