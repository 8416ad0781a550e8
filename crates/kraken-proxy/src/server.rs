//! Axum HTTP boundary
//!
//! One entry point on every path. `OPTIONS` is answered by the CORS layer
//! before any body is read. Everything else is parsed as a [`ProxyRequest`],
//! prepared, forwarded, and relayed with the upstream status.

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use kraken_types::{ProxyRequest, UpstreamResponse, KRAKEN_API_URL};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, info};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::outbound::prepare;
use crate::upstream::{HttpUpstream, Upstream};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct ProxyState {
    pub upstream: Arc<dyn Upstream>,
    /// Origin used when a request omits `environment`
    pub default_environment: String,
}

impl ProxyState {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            default_environment: KRAKEN_API_URL.to_string(),
        }
    }

    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = environment.into();
        self
    }
}

/// Permissive CORS: any origin, `POST`/`OPTIONS`, `Content-Type`/`Authorization`
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the axum router for the proxy
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .fallback(handle_proxy)
        .layer(cors_layer())
        .with_state(state)
}

async fn handle_proxy(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let result = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(body) => relay(&state, &body).await,
        Err(e) => Err(ProxyError::ReadBody(e.to_string())),
    };

    match result {
        Ok(upstream) => Ok(relayed_response(upstream)),
        Err(err) => {
            error!(error = %err, "Proxy error");
            Err(err)
        }
    }
}

/// Normalize, prepare, and forward one inbound body
///
/// The body is read in full with no size limit.
pub async fn relay(state: &ProxyState, body: &[u8]) -> ProxyResult<UpstreamResponse> {
    let request = ProxyRequest::from_json(body)?;
    debug!(
        method = request.method(),
        path = %request.path,
        signed = request.is_signed(),
        "Normalized proxy request"
    );

    let outbound = prepare(&request, &state.default_environment)?;
    Ok(state.upstream.send(outbound).await?)
}

fn relayed_response(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        upstream.body,
    )
        .into_response()
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(config: ProxyConfig, shutdown: F) -> ProxyResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let upstream = HttpUpstream::from_config(&config)?;
    let state = ProxyState::new(Arc::new(upstream))
        .with_default_environment(config.default_environment.clone());

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        environment = %config.default_environment,
        timeout_secs = config.timeout_secs,
        "Kraken proxy listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Kraken proxy stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{MockUpstream, UpstreamError};
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use kraken_auth::Credentials;
    use kraken_types::ErrorEnvelope;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    const DOC_KEY: &str =
        "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";

    fn app(mock: &Arc<MockUpstream>) -> Router {
        router(ProxyState::new(mock.clone()))
    }

    fn post(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers["access-control-allow-origin"], "*");
    }

    fn assert_envelope(status: StatusCode, headers: &HeaderMap, body: &str) -> ErrorEnvelope {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_cors(headers);
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error, "Proxy request failed");
        assert!(!envelope.details.is_empty());
        envelope
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let mock = Arc::new(MockUpstream::new());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/")
            .body(Body::from("{definitely not json"))
            .unwrap();

        let (status, headers, body) = call(app(&mock), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_cors(&headers);
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("POST") && methods.contains("OPTIONS"));
        let allowed = headers["access-control-allow-headers"].to_str().unwrap();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_browser_preflight() {
        let mock = Arc::new(MockUpstream::new());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/functions/v1/kraken-proxy")
            .header("origin", "https://app.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,authorization")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = call(app(&mock), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_large_body_is_forwarded() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_response(200, r#"{"error":[]}"#);

        let memo = "x".repeat(3 * 1024 * 1024);
        let json = format!(
            r#"{{"method":"POST","path":"/0/public/Time","body":{{"memo":"{}"}}}}"#,
            memo
        );
        let (status, _, body) = call(app(&mock), post("/", &json)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"error":[]}"#);

        let sent = mock.take_requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.as_deref().unwrap().len() > 3 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_large_malformed_body_returns_envelope() {
        let mock = Arc::new(MockUpstream::new());
        let json = format!("{{\"memo\":\"{}", "x".repeat(3 * 1024 * 1024));

        let (status, headers, body) = call(app(&mock), post("/", &json)).await;
        let envelope = assert_envelope(status, &headers, &body);
        assert!(envelope.details.starts_with("Invalid JSON"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_returns_envelope() {
        let mock = Arc::new(MockUpstream::new());
        let (status, headers, body) = call(app(&mock), post("/", "{oops")).await;

        let envelope = assert_envelope(status, &headers, &body);
        assert!(envelope.details.starts_with("Invalid JSON"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_other_inbound_verbs_use_same_path() {
        let mock = Arc::new(MockUpstream::new());
        let request = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = call(app(&mock), request).await;
        assert_envelope(status, &headers, &body);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_public_ticker_is_relayed() {
        let mock = Arc::new(MockUpstream::new());
        let upstream_body = r#"{"error":[],"result":{"XXBTZUSD":{"c":["97000.1","0.01"]}}}"#;
        mock.push_response(200, upstream_body);

        let (status, headers, body) = call(
            app(&mock),
            post(
                "/",
                r#"{"method":"GET","path":"/0/public/Ticker","query":{"pair":"XXBTZUSD,XETHZUSD"}}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, upstream_body);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_cors(&headers);

        let sent = mock.take_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(
            sent[0].url,
            "https://api.kraken.com/0/public/Ticker?pair=XXBTZUSD%2CXETHZUSD"
        );
        assert!(sent[0].body.is_none());
        assert!(sent[0].header("api-key").is_none());
        assert!(sent[0].header("api-sign").is_none());
        assert!(sent[0].header("content-type").is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_relayed_verbatim() {
        let mock = Arc::new(MockUpstream::new());
        let upstream_body = r#"{"error":["EQuery:Unknown asset pair"]}"#;
        mock.push_response(400, upstream_body);

        let (status, headers, body) = call(
            app(&mock),
            post("/", r#"{"path":"/0/public/Ticker","query":{"pair":"NOPE"}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, upstream_body);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_upstream_500_is_not_wrapped() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_response(500, "upstream exploded");

        let (status, _, body) = call(app(&mock), post("/", r#"{"path":"/0/public/Time"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "upstream exploded");
    }

    #[tokio::test]
    async fn test_private_balance_is_signed() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_response(200, r#"{"error":[],"result":{"ZUSD":"100.0000"}}"#);

        let json = format!(
            r#"{{"method":"POST","path":"/0/private/Balance","publicKey":"PK","privateKey":"{}"}}"#,
            DOC_KEY
        );
        let (status, _, _) = call(app(&mock), post("/", &json)).await;
        assert_eq!(status, StatusCode::OK);

        let sent = mock.take_requests();
        let forwarded = &sent[0];
        let body_text = forwarded.body.as_deref().unwrap();
        let body: Value = serde_json::from_str(body_text).unwrap();
        let fields = body.as_object().unwrap();
        assert_eq!(fields.len(), 1);
        let nonce = fields["nonce"].as_str().unwrap();
        assert!(nonce.len() >= 13 && nonce.chars().all(|c| c.is_ascii_digit()));

        assert_eq!(forwarded.header("api-key"), Some("PK"));
        assert_eq!(forwarded.header("content-type"), Some("application/json"));
        let expected = Credentials::new("PK", DOC_KEY)
            .unwrap()
            .sign("/0/private/Balance", nonce, body_text);
        assert_eq!(forwarded.header("api-sign"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_public_key_without_secret_still_gets_nonce() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_response(200, r#"{"error":["EAPI:Invalid key"]}"#);

        let (status, _, body) = call(
            app(&mock),
            post("/", r#"{"path":"/0/private/Balance","publicKey":"PK"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"error":["EAPI:Invalid key"]}"#);

        let sent = mock.take_requests();
        assert!(sent[0].body.as_deref().unwrap().contains("\"nonce\""));
        assert!(sent[0].header("api-key").is_none());
        assert!(sent[0].header("api-sign").is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_returns_envelope() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_error(UpstreamError::Timeout(Duration::from_secs(30)));

        let (status, headers, body) =
            call(app(&mock), post("/", r#"{"path":"/0/public/Time"}"#)).await;
        let envelope = assert_envelope(status, &headers, &body);
        assert!(envelope.details.contains("timed out"));
    }

    #[tokio::test]
    async fn test_signing_failure_returns_envelope() {
        let mock = Arc::new(MockUpstream::new());
        let (status, headers, body) = call(
            app(&mock),
            post(
                "/",
                r#"{"path":"/0/private/Balance","publicKey":"PK","privateKey":"not base64!"}"#,
            ),
        )
        .await;

        let envelope = assert_envelope(status, &headers, &body);
        assert!(envelope.details.contains("Invalid base64"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_default_environment_from_state() {
        let mock = Arc::new(MockUpstream::new());
        mock.push_response(200, "{}");
        let app = router(
            ProxyState::new(mock.clone()).with_default_environment("https://sandbox.test"),
        );

        call(app, post("/any/path", r#"{"path":"/0/public/Time"}"#)).await;
        assert_eq!(mock.take_requests()[0].url, "https://sandbox.test/0/public/Time");
    }
}
