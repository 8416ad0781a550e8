//! Error types for inbound request parsing

use thiserror::Error;

/// Errors raised while normalizing an inbound proxy request
#[derive(Error, Debug)]
pub enum RequestError {
    /// Body is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Body is JSON but not an object
    #[error("Request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A field has the wrong shape (e.g. a nested object as a query value)
    #[error("Invalid request field: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// Result type for request parsing
pub type RequestResult<T> = Result<T, RequestError>;
