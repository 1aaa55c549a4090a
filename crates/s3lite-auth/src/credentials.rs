//! Access key / secret key pair used for signing.

use std::fmt;

/// AWS access credentials.
///
/// The secret key is never printed by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    /// Access key ID, sent in clear inside the `Authorization` header.
    pub access_key: String,
    /// Secret access key, only used as the HMAC key.
    pub secret_key: String,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
