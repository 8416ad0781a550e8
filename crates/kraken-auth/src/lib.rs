//! Request signing for Kraken's private REST API
//!
//! Kraken authenticates private calls with two headers: `API-Key` carries the
//! public key and `API-Sign` carries an HMAC-SHA512 signature over the request
//! path, the nonce, and the exact bytes of the query string and body.
//!
//! # Example
//!
//! ```
//! use kraken_auth::{generate_nonce, Credentials, RequestSigner};
//!
//! # fn main() -> Result<(), kraken_auth::AuthError> {
//! let creds = Credentials::new("my-api-key", "c2VjcmV0")?;
//! let nonce = generate_nonce()?;
//! let body = format!(r#"{{"nonce":"{}"}}"#, nonce);
//!
//! let signer = RequestSigner::new(&creds, "/0/private/Balance", &nonce);
//! let signature = signer.sign("", &body);
//! assert!(!signature.is_empty());
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod nonce;

pub use credentials::{sign_message, Credentials, RequestSigner};
pub use error::{AuthError, AuthResult};
pub use nonce::generate_nonce;
