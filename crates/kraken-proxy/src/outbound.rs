//! Turns a [`ProxyRequest`] into the exact HTTP call sent upstream
//!
//! Steps, in order:
//! 1. Resolve method and origin
//! 2. Encode the query string
//! 3. Inject the nonce into the body when a public key is present
//! 4. Encode the body
//! 5. Sign query string + body when both keys are present

use kraken_auth::{generate_nonce, Credentials, RequestSigner};
use kraken_types::ProxyRequest;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use crate::encode::{encode_body, encode_query};
use crate::error::{ProxyError, ProxyResult};

pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");
pub const API_SIGN_HEADER: HeaderName = HeaderName::from_static("api-sign");

const NONCE_FIELD: &str = "nonce";

/// A fully encoded and, if requested, signed upstream call
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// `environment + path`, plus `?query` when the query is non-empty
    pub url: String,
    pub headers: HeaderMap,
    /// Compact JSON body, absent when the body mapping is empty
    pub body: Option<String>,
}

impl UpstreamRequest {
    /// Header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Build the upstream call for `request`
///
/// `default_environment` is used when the request names no origin.
pub fn prepare(request: &ProxyRequest, default_environment: &str) -> ProxyResult<UpstreamRequest> {
    let method = parse_method(request.method())?;

    let query_string = encode_query(&request.query)?;
    let mut url = format!(
        "{}{}",
        request.environment_or(default_environment),
        request.path
    );
    if !query_string.is_empty() {
        url.push('?');
        url.push_str(&query_string);
    }

    let mut body = request.body.clone();
    let nonce = if request.has_public_key() {
        Some(inject_nonce(&mut body)?)
    } else {
        None
    };
    let body_text = encode_body(&body)?;

    let mut headers = HeaderMap::new();
    if body_text.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let (Some(nonce), true) = (nonce.as_deref(), request.is_signed()) {
        let credentials = Credentials::new(request.public_key.as_str(), &request.private_key)?;
        let signer = RequestSigner::new(&credentials, &request.path, nonce);
        let signature = signer.sign(&query_string, body_text.as_deref().unwrap_or(""));

        let api_key =
            HeaderValue::from_str(signer.api_key()).map_err(|_| ProxyError::InvalidHeader("API-Key"))?;
        let mut api_sign =
            HeaderValue::from_str(&signature).map_err(|_| ProxyError::InvalidHeader("API-Sign"))?;
        api_sign.set_sensitive(true);

        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(API_SIGN_HEADER, api_sign);
        debug!(path = %request.path, nonce, "Signed upstream request");
    }

    Ok(UpstreamRequest {
        method,
        url,
        headers,
        body: body_text,
    })
}

fn parse_method(method: &str) -> ProxyResult<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ProxyError::InvalidMethod(method.to_string()))
}

/// Ensure `body.nonce` is set and return its text
///
/// A caller-supplied nonce is kept unless it is falsy (`null`, `false`, `0`,
/// `""`), in which case a fresh millisecond nonce replaces it.
fn inject_nonce(body: &mut Map<String, Value>) -> ProxyResult<String> {
    if let Some(existing) = body.get(NONCE_FIELD).filter(|v| is_truthy(v)) {
        return Ok(nonce_text(existing));
    }
    let nonce = generate_nonce()?;
    body.insert(NONCE_FIELD.to_string(), Value::String(nonce.clone()));
    Ok(nonce)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn nonce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
