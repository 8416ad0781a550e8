//! Nonce generation
//!
//! Kraken requires a strictly increasing nonce per API key. The proxy uses the
//! wall-clock millisecond timestamp, so two signed calls with the same key in
//! the same millisecond collide and upstream rejects the second one. Ordering
//! such calls is up to the caller.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AuthError, AuthResult};

/// Current Unix time in milliseconds, as decimal text
pub fn generate_nonce() -> AuthResult<String> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AuthError::SystemClock)?
        .as_millis()
        .to_string())
}
