//! The caller's side of an issued operation.

use s3lite_model::{OperationId, Progress, S3Operation, S3Response};
use tokio::sync::{oneshot, watch};

use crate::error::ClientError;

/// Returned by every operation entry point of [`S3Client`](crate::S3Client).
///
/// The response is delivered exactly once, through [`finished`](Self::finished).
#[derive(Debug)]
pub struct ResponseHandle {
    pub(crate) id: OperationId,
    pub(crate) operation: S3Operation,
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) receiver: oneshot::Receiver<S3Response>,
    pub(crate) progress: Option<watch::Receiver<Progress>>,
}

impl ResponseHandle {
    /// Operation identifier, matching [`S3Response::id`].
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Operation kind.
    #[must_use]
    pub fn operation(&self) -> S3Operation {
        self.operation
    }

    /// Key with a leading `/`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// URL of the first request issued.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Live transfer progress, for downloads and uploads.
    #[must_use]
    pub fn progress(&self) -> Option<watch::Receiver<Progress>> {
        self.progress.clone()
    }

    /// Wait for the operation to reach a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] if the client was dropped first.
    pub async fn finished(self) -> Result<S3Response, ClientError> {
        self.receiver.await.map_err(|_| ClientError::Cancelled)
    }
}
