//! Upstream transport abstraction
//!
//! The proxy sends each prepared call through an [`Upstream`]. In production
//! that is [`HttpUpstream`] (reqwest); tests inject `MockUpstream` to capture
//! exactly what would have gone on the wire.
//!
//! There is no retry. Status and body text come back untouched.

use async_trait::async_trait;
use kraken_types::UpstreamResponse;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ProxyConfig;
use crate::outbound::UpstreamRequest;

/// Failures before any upstream response was received
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Whole call exceeded the configured timeout
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// DNS, connect, TLS, or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection could not be used (raised by test transports)
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// Sends a prepared request and returns the raw reply
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed upstream
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    timeout: Duration,
}

impl HttpUpstream {
    /// Create a transport with a whole-request timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Http(err)
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let UpstreamRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        debug!(status, bytes = text.len(), "Upstream responded");
        Ok(UpstreamResponse::new(status, text))
    }
}

/// Mock upstream for testing
///
/// Returns scripted replies in order and records every request it receives.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MockUpstream {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<UpstreamResponse, UpstreamError>>>,
    requests: parking_lot::Mutex<Vec<UpstreamRequest>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockUpstream {
    /// Create a new mock upstream
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Ok(UpstreamResponse::new(status, body)));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: UpstreamError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Requests received so far, draining the log
    pub fn take_requests(&self) -> Vec<UpstreamRequest> {
        std::mem::take(&mut *self.requests.lock())
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Upstream for MockUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.requests.lock().push(request);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(UpstreamError::ConnectionFailed(
                "no scripted response".to_string(),
            ))
        })
    }
}
