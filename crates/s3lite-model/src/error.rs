//! The S3 error document carried by failed responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured failure information for a response.
///
/// The first four fields mirror the S3 `<Error>` document. `internal` is used
/// when there is no vendor document to decode: transport failures, XML decode
/// failures, or a bare non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Error {
    /// Vendor error code, e.g. `NoSuchKey`.
    pub code: String,
    /// Human-readable message from the server.
    pub message: String,
    /// Server-assigned request ID.
    pub request_id: String,
    /// Resource the error refers to.
    pub resource: String,
    /// Transport or client-side failure description.
    pub internal: String,
}

impl S3Error {
    /// An error with only the internal description populated.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            internal: message.into(),
            ..Self::default()
        }
    }

    /// Whether every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
            && self.message.is_empty()
            && self.request_id.is_empty()
            && self.resource.is_empty()
            && self.internal.is_empty()
    }
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.is_empty(), self.internal.is_empty()) {
            (false, _) => write!(f, "{}: {}", self.code, self.message),
            (true, false) => f.write_str(&self.internal),
            (true, true) => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_be_empty_by_default() {
        assert!(S3Error::default().is_empty());
    }

    #[test]
    fn test_should_not_be_empty_with_any_field() {
        assert!(!S3Error::internal("network error").is_empty());

        let err = S3Error {
            request_id: "4442587FB7D0A2F9".to_owned(),
            ..S3Error::default()
        };
        assert!(!err.is_empty());
    }

    #[test]
    fn test_should_display_vendor_code_before_internal_message() {
        let err = S3Error {
            code: "NoSuchKey".to_owned(),
            message: "The resource you requested does not exist".to_owned(),
            internal: "HTTP 404".to_owned(),
            ..S3Error::default()
        };
        assert_eq!(
            err.to_string(),
            "NoSuchKey: The resource you requested does not exist"
        );
        assert_eq!(S3Error::internal("HTTP 404").to_string(), "HTTP 404");
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&S3Error::internal("x")).expect("test serialization");
        assert!(json.contains("requestId"));
    }
}
