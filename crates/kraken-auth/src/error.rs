//! Error types for signing operations

/// Errors that can occur while preparing a signed request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Wall clock is before the Unix epoch
    #[error("System clock error: time went backwards")]
    SystemClock,
}

/// Result type for signing operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::InvalidCredentials("Invalid base64 private key".to_string());
        assert!(err.to_string().contains("Invalid base64 private key"));
    }
}
