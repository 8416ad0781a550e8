//! Relayed responses and the proxy's failure envelope

use serde::{Deserialize, Serialize};

/// `error` field of every proxy-internal failure
pub const PROXY_FAILURE: &str = "Proxy request failed";

/// Body returned with HTTP 500 when the proxy itself fails
///
/// ```json
/// {"error": "Proxy request failed", "details": "Invalid JSON: ..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: String,
}

impl ErrorEnvelope {
    pub fn proxy_failure(details: impl Into<String>) -> Self {
        Self {
            error: PROXY_FAILURE.to_string(),
            details: details.into(),
        }
    }
}

/// Status and raw body text of an upstream reply, relayed unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The proxy's own failure envelope, if this is one
    ///
    /// Distinguishes a proxy-side 500 from an upstream 500 relayed verbatim.
    pub fn proxy_failure(&self) -> Option<ErrorEnvelope> {
        if self.status != 500 {
            return None;
        }
        serde_json::from_str::<ErrorEnvelope>(&self.body)
            .ok()
            .filter(|envelope| envelope.error == PROXY_FAILURE)
    }
}
