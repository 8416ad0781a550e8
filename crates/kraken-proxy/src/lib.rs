//! CORS-enabled signing proxy for Kraken's REST API
//!
//! Browser front ends cannot talk to Kraken directly: CORS gets in the way and
//! private calls need an HMAC signature. This crate accepts a JSON
//! [`ProxyRequest`](kraken_types::ProxyRequest) on any path, signs it when
//! credentials are present, forwards it, and relays the upstream status and
//! body untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use kraken_proxy::{serve, ProxyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProxyConfig::from_env()?;
//!     serve(config, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Request Flow
//!
//! 1. `OPTIONS` is answered by the CORS layer
//! 2. The body is parsed and normalized ([`kraken_types::ProxyRequest::from_json`])
//! 3. Query and body are encoded once ([`encode`]), a nonce is injected when a
//!    public key is present, and headers are signed ([`outbound::prepare`])
//! 4. The call goes out through an [`Upstream`]
//! 5. Status and body text come back as-is; any local failure becomes a 500
//!    with `{"error":"Proxy request failed","details":...}`

pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod outbound;
pub mod server;
pub mod upstream;

pub use client::ProxyClient;
pub use config::{ConfigError, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
pub use outbound::{prepare, UpstreamRequest};
pub use server::{cors_layer, relay, router, serve, ProxyState};
pub use upstream::{HttpUpstream, Upstream, UpstreamError};

#[cfg(any(test, feature = "test-utils"))]
pub use upstream::MockUpstream;
