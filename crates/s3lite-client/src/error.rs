//! Client error types.
//!
//! [`ClientError`] is returned synchronously by the operation entry points
//! (precondition and request-construction failures) and by
//! [`ResponseHandle::finished`](crate::ResponseHandle::finished) when the
//! client is dropped first. Failures reported by S3 itself are not Rust
//! errors: they arrive as a failed [`S3Response`](s3lite_model::S3Response)
//! carrying an [`S3Error`](s3lite_model::S3Error).

use s3lite_auth::AuthError;

/// Errors surfaced directly to the caller of an operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // -----------------------------------------------------------------------
    // Preconditions
    // -----------------------------------------------------------------------
    /// The key is empty or the root path.
    #[error("key must not be empty or the root path: {key:?}")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// The key ends with `/` but the operation addresses an object.
    #[error("key names a folder, not an object: {key}")]
    FolderKey {
        /// The rejected key.
        key: String,
    },

    /// The key does not end with `/` but the operation creates a folder.
    #[error("key does not name a folder: {key}")]
    NotAFolderKey {
        /// The rejected key.
        key: String,
    },

    /// An upload was attempted with no data.
    #[error("payload must not be empty")]
    EmptyPayload,

    /// The source bucket of a copy is empty.
    #[error("source bucket must not be empty")]
    EmptyBucket,

    /// No bucket is configured, so there is no host to address.
    #[error("no bucket configured")]
    MissingBucket,

    /// `CannedAcl::None` was passed where an ACL must be sent.
    #[error("a canned ACL token is required")]
    MissingCannedAcl,

    // -----------------------------------------------------------------------
    // Request construction
    // -----------------------------------------------------------------------
    /// The request could not be assembled.
    #[error("failed to build request: {0}")]
    Http(#[from] http::Error),

    /// A header value contains characters HTTP does not allow.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Signing failed.
    #[error("failed to sign request: {0}")]
    Auth(#[from] AuthError),

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------
    /// The client was dropped before the operation finished.
    #[error("operation cancelled before completion")]
    Cancelled,
}

impl ClientError {
    /// Whether the error is a rejected call argument.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::FolderKey { .. }
                | Self::NotAFolderKey { .. }
                | Self::EmptyPayload
                | Self::EmptyBucket
                | Self::MissingBucket
                | Self::MissingCannedAcl
        )
    }
}
