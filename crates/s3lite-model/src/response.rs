//! Responses and their lifecycle.
//!
//! Every logical operation produces exactly one [`S3Response`]. The
//! dispatcher owns it while the request is in flight and moves it through
//! the [`ResponseState`] machine:
//!
//! ```text
//! Pending ──> Succeeded
//!    │   └──> Failed
//!    └──> Continuing ──> Continuing ... ──> Succeeded | Failed
//! ```
//!
//! `Continuing` is only reachable for listings, when a truncated page has
//! been received and the next page has been requested. A terminal state is
//! entered exactly once; after that the response is handed to the caller.

use std::fmt;

use bytes::Bytes;

use crate::error::S3Error;
use crate::operations::S3Operation;
use crate::types::{Acl, Progress, S3Object};

/// Identifier of one logical operation, stable across listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle state of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseState {
    /// Issued, awaiting the transport.
    #[default]
    Pending,
    /// A truncated listing page was received and the next page requested.
    Continuing,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl ResponseState {
    /// Whether no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Returned when the dispatcher attempts a transition the state machine forbids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid response state transition for {operation}: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// Operation the response belongs to.
    pub operation: S3Operation,
    /// State before the attempted transition.
    pub from: ResponseState,
    /// Requested state.
    pub to: ResponseState,
}

/// Accumulated result of a (possibly multi-page) listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListObjectsOutput {
    /// Objects from every page, in server order.
    pub objects: Vec<S3Object>,
    /// `CommonPrefixes` from every page, when a delimiter was used.
    pub common_prefixes: Vec<String>,
    /// Truncation flag of the last page received.
    pub is_truncated: bool,
    /// Prefix echoed by the server.
    pub prefix: String,
    /// Number of pages received.
    pub pages: u32,
}

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetObjectOutput {
    /// Raw object body.
    pub data: Bytes,
    /// Final transfer progress.
    pub progress: Progress,
}

/// Result of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PutObjectOutput {
    /// Final transfer progress.
    pub progress: Progress,
}

/// Result of an ACL read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetAclOutput {
    /// Decoded ACL.
    pub acl: Acl,
}

/// Operation-specific part of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Accumulated listing.
    ListObjects(ListObjectsOutput),
    /// Downloaded object.
    GetObject(GetObjectOutput),
    /// Upload summary.
    PutObject(PutObjectOutput),
    /// Delete carries no payload.
    RemoveObject,
    /// Copy carries no payload.
    CopyObject,
    /// Decoded ACL.
    GetAcl(GetAclOutput),
    /// ACL replacement carries no payload.
    SetAcl,
}

impl ResponsePayload {
    /// An empty payload for the given operation.
    #[must_use]
    pub fn empty(operation: S3Operation) -> Self {
        match operation {
            S3Operation::ListObjects => Self::ListObjects(ListObjectsOutput::default()),
            S3Operation::GetObject => Self::GetObject(GetObjectOutput::default()),
            S3Operation::PutObject => Self::PutObject(PutObjectOutput::default()),
            S3Operation::RemoveObject => Self::RemoveObject,
            S3Operation::CopyObject => Self::CopyObject,
            S3Operation::GetAcl => Self::GetAcl(GetAclOutput::default()),
            S3Operation::SetAcl => Self::SetAcl,
        }
    }

    /// The operation this payload belongs to.
    #[must_use]
    pub fn operation(&self) -> S3Operation {
        match self {
            Self::ListObjects(_) => S3Operation::ListObjects,
            Self::GetObject(_) => S3Operation::GetObject,
            Self::PutObject(_) => S3Operation::PutObject,
            Self::RemoveObject => S3Operation::RemoveObject,
            Self::CopyObject => S3Operation::CopyObject,
            Self::GetAcl(_) => S3Operation::GetAcl,
            Self::SetAcl => S3Operation::SetAcl,
        }
    }
}

/// The result of one logical S3 operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Response {
    /// Operation identifier assigned at issue time.
    pub id: OperationId,
    /// Key the request addressed (always starts with `/`).
    pub key: String,
    /// Full URL of the most recent request.
    pub url: String,
    /// HTTP status of the most recent page, if the transport got that far.
    pub status_code: Option<http::StatusCode>,
    /// Set when the response finished in [`ResponseState::Succeeded`].
    pub succeeded: bool,
    /// Failure details; empty on success.
    pub error: S3Error,
    /// Operation-specific result.
    pub payload: ResponsePayload,
    state: ResponseState,
}

impl S3Response {
    /// A pending response for the given operation.
    #[must_use]
    pub fn new(
        id: OperationId,
        operation: S3Operation,
        key: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            url: url.into(),
            status_code: None,
            succeeded: false,
            error: S3Error::default(),
            payload: ResponsePayload::empty(operation),
            state: ResponseState::Pending,
        }
    }

    /// The operation discriminator.
    #[must_use]
    pub fn operation(&self) -> S3Operation {
        self.payload.operation()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Record that another listing page has been requested.
    ///
    /// # Errors
    ///
    /// Fails for non-listing responses and for terminal responses.
    pub fn mark_continuing(&mut self) -> Result<(), InvalidTransition> {
        if self.state.is_terminal() || self.operation() != S3Operation::ListObjects {
            return Err(self.invalid(ResponseState::Continuing));
        }
        self.state = ResponseState::Continuing;
        Ok(())
    }

    /// Enter [`ResponseState::Succeeded`].
    ///
    /// # Errors
    ///
    /// Fails if the response is already terminal.
    pub fn succeed(&mut self) -> Result<(), InvalidTransition> {
        self.finish(ResponseState::Succeeded)
    }

    /// Enter [`ResponseState::Failed`] with the given error.
    ///
    /// # Errors
    ///
    /// Fails if the response is already terminal; the error is not recorded.
    pub fn fail(&mut self, error: S3Error) -> Result<(), InvalidTransition> {
        self.finish(ResponseState::Failed)?;
        self.error = error;
        Ok(())
    }

    /// Listing output, if this is a listing.
    #[must_use]
    pub fn list_objects(&self) -> Option<&ListObjectsOutput> {
        match &self.payload {
            ResponsePayload::ListObjects(out) => Some(out),
            _ => None,
        }
    }

    /// Download output, if this is a download.
    #[must_use]
    pub fn get_object(&self) -> Option<&GetObjectOutput> {
        match &self.payload {
            ResponsePayload::GetObject(out) => Some(out),
            _ => None,
        }
    }

    /// Upload output, if this is an upload.
    #[must_use]
    pub fn put_object(&self) -> Option<&PutObjectOutput> {
        match &self.payload {
            ResponsePayload::PutObject(out) => Some(out),
            _ => None,
        }
    }

    /// Decoded ACL, if this is an ACL read.
    #[must_use]
    pub fn acl(&self) -> Option<&Acl> {
        match &self.payload {
            ResponsePayload::GetAcl(out) => Some(&out.acl),
            _ => None,
        }
    }

    fn finish(&mut self, to: ResponseState) -> Result<(), InvalidTransition> {
        if self.state.is_terminal() {
            return Err(self.invalid(to));
        }
        self.state = to;
        self.succeeded = to == ResponseState::Succeeded;
        Ok(())
    }

    fn invalid(&self, to: ResponseState) -> InvalidTransition {
        InvalidTransition {
            operation: self.operation(),
            from: self.state,
            to,
        }
    }
}
