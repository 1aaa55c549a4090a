//! Client-wide completion events.

use s3lite_model::{OperationId, S3Error, S3Operation};

/// Broadcast to every [`S3Client::subscribe`](crate::S3Client::subscribe) receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// An operation finished successfully.
    Finished {
        /// Operation identifier.
        id: OperationId,
        /// Operation kind.
        operation: S3Operation,
        /// Key the operation addressed.
        key: String,
    },
    /// An operation finished with an error.
    Failed {
        /// Operation identifier.
        id: OperationId,
        /// Operation kind.
        operation: S3Operation,
        /// Key the operation addressed.
        key: String,
        /// Failure details.
        error: S3Error,
    },
    /// The dispatcher could not match a completion to a pending operation.
    InternalError {
        /// Description of the defect.
        message: String,
    },
}

impl ClientEvent {
    /// The operation kind, for `Finished` and `Failed` events.
    #[must_use]
    pub fn operation(&self) -> Option<S3Operation> {
        match self {
            Self::Finished { operation, .. } | Self::Failed { operation, .. } => Some(*operation),
            Self::InternalError { .. } => None,
        }
    }
}
