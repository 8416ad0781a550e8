//! Error types for the proxy
//!
//! Every variant surfaces to callers the same way: HTTP 500 with the
//! [`ErrorEnvelope`] body. The variants only matter for logs and tests.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kraken_auth::AuthError;
use kraken_types::{ErrorEnvelope, RequestError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::upstream::UpstreamError;

/// Errors that can occur while handling a proxy call
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Inbound body could not be normalized
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Inbound body could not be read
    #[error("Failed to read request body: {0}")]
    ReadBody(String),

    /// `method` is not a valid HTTP method token
    #[error("Invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// Query or body could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// Nonce generation or signing failed
    #[error("Signing failed: {0}")]
    Auth(#[from] AuthError),

    /// A header value contains characters HTTP does not allow
    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// No response was received from upstream
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::proxy_failure(self.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
    }
}
