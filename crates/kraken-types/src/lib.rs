//! Shared types for the Kraken signing proxy
//!
//! This crate holds the wire model used by both sides of the proxy. It has
//! minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`ProxyRequest`] - Logical request posted by callers
//! - [`QueryValue`], [`Scalar`] - Query parameter values
//! - [`UpstreamResponse`] - Relayed status and body
//! - [`ErrorEnvelope`] - Body of a proxy-side failure
//! - [`RequestError`] - Inbound parsing errors

pub mod error;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::*;
pub use request::*;
pub use response::*;
