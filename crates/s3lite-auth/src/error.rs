//! Signing error types.

/// Errors that can occur while signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HMAC key could not be initialized from the secret key.
    #[error("invalid signing key")]
    InvalidSigningKey,

    /// A computed header value contains characters HTTP does not allow.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}
