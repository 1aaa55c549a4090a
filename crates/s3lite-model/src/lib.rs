//! Domain types and response model for the s3lite S3 client.
//!
//! - [`types`] holds the entities decoded from S3 responses ([`S3Object`],
//!   [`Acl`], [`AclPermission`]) and the request-side selectors
//!   ([`CannedAcl`], [`FileMetadata`]).
//! - [`error`] holds the vendor [`S3Error`] document carried by failed responses.
//! - [`operations`] enumerates the supported [`S3Operation`]s.
//! - [`response`] holds [`S3Response`], its per-operation payloads, and the
//!   [`ResponseState`] machine driven by the dispatcher.
#![allow(clippy::struct_excessive_bools)]

pub mod error;
pub mod operations;
pub mod response;
pub mod types;

pub use error::S3Error;
pub use operations::S3Operation;
pub use response::{
    GetAclOutput, GetObjectOutput, InvalidTransition, ListObjectsOutput, OperationId,
    PutObjectOutput, ResponsePayload, ResponseState, S3Response,
};
pub use types::{
    Acl, AclPermission, CannedAcl, FileMetadata, ParseCannedAclError, Permission, Progress,
    S3Object,
};
