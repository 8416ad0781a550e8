//! Authentication credentials for Kraken API
//!
//! Implements HMAC-SHA512 signing as required by Kraken's private endpoints.
//!
//! # Security
//!
//! Private keys are stored using the `secrecy` crate which:
//! - Zeroizes memory on drop (prevents memory scanning)
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretBox};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{AuthError, AuthResult};

type HmacSha512 = Hmac<Sha512>;

/// Compute a Kraken `API-Sign` value
///
/// Kraken signature algorithm:
/// 1. SHA256(nonce + message)
/// 2. HMAC-SHA512(secret, uri_path + SHA256_result)
/// 3. Base64 encode result
///
/// `message` is the exact query string followed by the exact body text
/// that go on the wire. No delimiters are inserted anywhere.
pub fn sign_message(secret: &[u8], path: &str, nonce: &str, message: &str) -> String {
    // Step 1: SHA256(nonce + message)
    let mut sha256 = Sha256::new();
    sha256.update(nonce.as_bytes());
    sha256.update(message.as_bytes());
    let sha256_result = sha256.finalize();

    // Step 2: path + SHA256_result (raw digest bytes)
    let mut payload = path.as_bytes().to_vec();
    payload.extend_from_slice(&sha256_result);

    // Step 3: HMAC-SHA512(secret, payload)
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(&payload);
    let result = mac.finalize();

    // Step 4: Base64 encode
    BASE64.encode(result.into_bytes())
}

/// API credentials for authenticated requests
///
/// Private keys are automatically zeroized when the Credentials are dropped,
/// preventing sensitive data from remaining in memory.
pub struct Credentials {
    /// API key (public)
    api_key: String,
    /// Private key (decoded from base64, zeroized on drop)
    private_key: SecretBox<Vec<u8>>,
}

impl Credentials {
    /// Create new credentials from API key and private key
    ///
    /// # Arguments
    /// * `api_key` - Kraken API key, sent as `API-Key`
    /// * `private_key` - Private key (base64 encoded string)
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCredentials`] if the private key is not valid base64.
    pub fn new(api_key: impl Into<String>, private_key: impl AsRef<str>) -> AuthResult<Self> {
        let decoded = BASE64.decode(private_key.as_ref()).map_err(|e| {
            AuthError::InvalidCredentials(format!("Invalid base64 private key: {}", e))
        })?;

        Ok(Self {
            api_key: api_key.into(),
            private_key: SecretBox::new(Box::new(decoded)),
        })
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign `message` for `path` under `nonce`
    ///
    /// # Arguments
    /// * `path` - API endpoint path without query (e.g., "/0/private/Balance")
    /// * `nonce` - Nonce text exactly as it appears in the body
    /// * `message` - Query string followed by body text
    ///
    /// # Returns
    /// Base64-encoded signature
    pub fn sign(&self, path: &str, nonce: &str, message: &str) -> String {
        sign_message(self.private_key.expose_secret(), path, nonce, message)
    }
}

impl Clone for Credentials {
    /// Clone credentials (creates new SecretBox with same content)
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            private_key: SecretBox::new(Box::new(self.private_key.expose_secret().clone())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.api_key.chars().take(8).collect();
        f.debug_struct("Credentials")
            .field("api_key", &format!("{}...", prefix))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Signs one outgoing request
///
/// Binds credentials, path, and nonce so the query string and body text can
/// be signed once they are encoded.
#[derive(Debug)]
pub struct RequestSigner<'a> {
    credentials: &'a Credentials,
    path: &'a str,
    nonce: &'a str,
}

impl<'a> RequestSigner<'a> {
    /// Create a new request signer
    pub fn new(credentials: &'a Credentials, path: &'a str, nonce: &'a str) -> Self {
        Self {
            credentials,
            path,
            nonce,
        }
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Sign the encoded query string and body text
    ///
    /// Either part may be empty.
    pub fn sign(&self, query_string: &str, body: &str) -> String {
        let message = format!("{}{}", query_string, body);
        self.credentials.sign(self.path, self.nonce, &message)
    }
}
