//! Asynchronous S3 REST client.
//!
//! Every operation is one signed HTTP exchange (a listing may chain several,
//! one per page). Operations return a [`ResponseHandle`] immediately; the
//! dispatcher finalizes the [`S3Response`](s3lite_model::S3Response) in the
//! background and delivers it exactly once.
//!
//! # Modules
//!
//! - [`client`] - [`S3Client`] and the completion/continuation dispatcher
//! - [`config`] - [`ClientConfig`], loadable from the environment
//! - [`error`] - [`ClientError`], returned before a request is sent
//! - [`event`] - [`ClientEvent`], broadcast for every finished operation
//! - [`handle`] - [`ResponseHandle`], the caller's side of an operation
//! - [`request`] - [`S3Request`] preparation and signing
//! - [`transport`] - the [`Transport`] seam and [`ReqwestTransport`]
//! - [`url`] - virtual-hosted bucket URLs
//! - [`validation`] - argument checks

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod handle;
mod registry;
pub mod request;
pub mod transport;
pub mod url;
pub mod validation;

pub use client::{DEFAULT_CONTENT_TYPE, DEFAULT_MAX_KEYS, S3Client};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::ClientEvent;
pub use handle::ResponseHandle;
pub use request::S3Request;
pub use transport::{
    ProgressReporter, ReqwestTransport, TransferDirection, Transport, TransportError,
    TransportFuture, TransportResponse,
};
pub use s3lite_model::{
    Acl, AclPermission, CannedAcl, FileMetadata, OperationId, Progress, ResponseState, S3Error,
    S3Object, S3Operation, S3Response,
};
