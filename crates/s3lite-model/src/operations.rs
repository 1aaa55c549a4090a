//! Supported S3 operations.

/// All operations the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// List the objects of a bucket, following pagination.
    ListObjects,
    /// Download an object.
    GetObject,
    /// Upload an object or create a folder marker.
    PutObject,
    /// Delete an object.
    RemoveObject,
    /// Server-side copy of an object.
    CopyObject,
    /// Read the ACL of an object or the bucket.
    GetAcl,
    /// Replace the ACL of an object with a canned ACL.
    SetAcl,
}

impl S3Operation {
    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListObjects => "ListObjects",
            Self::GetObject => "GetObject",
            Self::PutObject => "PutObject",
            Self::RemoveObject => "RemoveObject",
            Self::CopyObject => "CopyObject",
            Self::GetAcl => "GetAcl",
            Self::SetAcl => "SetAcl",
        }
    }

    /// Returns the HTTP method used on the wire.
    #[must_use]
    pub fn method(&self) -> http::Method {
        match self {
            Self::ListObjects | Self::GetObject | Self::GetAcl => http::Method::GET,
            Self::PutObject | Self::CopyObject | Self::SetAcl => http::Method::PUT,
            Self::RemoveObject => http::Method::DELETE,
        }
    }

    /// Whether a successful response carries an XML body that must decode.
    #[must_use]
    pub fn expects_xml_body(&self) -> bool {
        matches!(self, Self::ListObjects | Self::GetAcl)
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_operations_to_http_methods() {
        assert_eq!(S3Operation::ListObjects.method(), http::Method::GET);
        assert_eq!(S3Operation::GetAcl.method(), http::Method::GET);
        assert_eq!(S3Operation::CopyObject.method(), http::Method::PUT);
        assert_eq!(S3Operation::SetAcl.method(), http::Method::PUT);
        assert_eq!(S3Operation::RemoveObject.method(), http::Method::DELETE);
    }

    #[test]
    fn test_should_only_expect_xml_for_list_and_get_acl() {
        assert!(S3Operation::ListObjects.expects_xml_body());
        assert!(S3Operation::GetAcl.expects_xml_body());
        assert!(!S3Operation::GetObject.expects_xml_body());
        assert!(!S3Operation::SetAcl.expects_xml_body());
    }
}
