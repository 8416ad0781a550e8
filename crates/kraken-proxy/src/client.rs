//! Caller-side client for a running proxy
//!
//! Mirrors what a browser front end does: POST the [`ProxyRequest`] as JSON,
//! optionally with a bearer token, and read back status and body text.

use kraken_types::{ProxyRequest, UpstreamResponse};
use reqwest::Client;
use tracing::{debug, warn};

use crate::upstream::UpstreamError;

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    endpoint: String,
    bearer: Option<String>,
}

impl ProxyClient {
    /// Create a client for the proxy at `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            bearer: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every call
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Forward one request through the proxy
    ///
    /// Non-2xx statuses are returned as-is; only transport failures are errors.
    pub async fn send(&self, request: &ProxyRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let reply = UpstreamResponse::new(status, body);
        match reply.proxy_failure() {
            Some(envelope) => warn!(path = %request.path, details = %envelope.details, "Proxy failed"),
            None => debug!(path = %request.path, status, "Proxy replied"),
        }
        Ok(reply)
    }
}
