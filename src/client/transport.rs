//! Low-level transport abstraction.
//!
//! The pipeline performs its network calls through an injected
//! [`Transport`] so the orchestration can be exercised against
//! programmable fakes; the default implementation wraps a shared
//! [`reqwest::Client`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::client::types::BoxError;

/// Wire-level request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Undecoded response produced by the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub final_url: String,
}

/// Transport-level failures, prior to pipeline classification.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed")]
    Connect(#[source] BoxError),

    /// The transport's own deadline fired before a response arrived.
    #[error("transport deadline exceeded")]
    TimedOut,

    /// Any other transport failure (DNS, reset mid-body, invalid URL).
    #[error("transport error")]
    Other(#[source] BoxError),
}

/// One network call. Implementations must be shareable across concurrent
/// requests; the pipeline applies its own deadline, retry and
/// cancellation around `execute`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Default transport over a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Wrap a caller-configured client (proxies, TLS settings, pools).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let url: url::Url = request
            .url
            .parse()
            .map_err(|error: url::ParseError| TransportError::Other(Box::new(error)))?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(RawResponse {
            status,
            headers,
            body,
            final_url,
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut
    } else if error.is_connect() {
        TransportError::Connect(Box::new(error))
    } else {
        TransportError::Other(Box::new(error))
    }
}
