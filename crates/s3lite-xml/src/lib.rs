//! S3 XML decoding for s3lite.
//!
//! This crate converts the XML bodies S3 returns into typed values. S3 uses the
//! RestXml protocol with `noErrorWrapping: true`, so errors arrive as a flat
//! `<Error>` document.
//!
//! # Key components
//!
//! - [`S3Deserialize`] trait with [`from_xml`] and [`from_xml_element`] entry points
//! - [`decode_list_page`] for one page of a `GET Bucket` listing
//! - [`decode_acl`] for `GET ?acl` responses
//! - [`decode_error`] for the `<Error>` document of a failed request
//!
//! # Example
//!
//! ```
//! let body = b"<Error><Code>NoSuchKey</Code><Message>missing</Message></Error>";
//! let error = s3lite_xml::decode_error(body).unwrap();
//! assert_eq!(error.code, "NoSuchKey");
//! ```

pub mod acl;
pub mod deserialize;
pub mod error;
pub mod types;

use s3lite_model::S3Error;

pub use acl::decode_acl;
pub use deserialize::{S3Deserialize, from_xml, from_xml_element};
pub use error::XmlError;
pub use types::{AccessControlPolicy, Grant, Grantee, GranteeType, ListBucketResult, Owner};

/// Decode one `ListBucketResult` page.
///
/// # Errors
///
/// Returns `XmlError` if the body is not a well-formed `ListBucketResult`.
pub fn decode_list_page(xml: &[u8]) -> Result<ListBucketResult, XmlError> {
    from_xml_element(xml, "ListBucketResult")
}

/// Decode an S3 `<Error>` document.
///
/// # Errors
///
/// Returns `XmlError` if the body is not a well-formed `<Error>` document.
pub fn decode_error(xml: &[u8]) -> Result<S3Error, XmlError> {
    from_xml_element(xml, "Error")
}
