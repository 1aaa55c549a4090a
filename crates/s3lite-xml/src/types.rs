//! Wire shapes of the XML documents returned by S3.
//!
//! These mirror the documents as sent; the conversion into domain types
//! (for example [`s3lite_model::Acl`]) happens in [`crate::acl`].

use s3lite_model::S3Object;

/// One page of a `GET Bucket` listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListBucketResult {
    /// Bucket name echoed by the server.
    pub name: String,
    /// `Prefix` echoed by the server.
    pub prefix: String,
    /// `Marker` echoed by the server.
    pub marker: String,
    /// `NextMarker`, only sent when a delimiter was used.
    pub next_marker: Option<String>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Objects on this page, in server order. Entries with an empty key are dropped.
    pub contents: Vec<S3Object>,
    /// `CommonPrefixes/Prefix` values on this page.
    pub common_prefixes: Vec<String>,
}

impl ListBucketResult {
    /// Key of the last object on the page, used as the next `marker`.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.contents.last().map(|o| o.key.as_str())
    }
}

/// `<Owner>` of an access control policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Owner {
    /// `ID`, the canonical user ID.
    pub id: Option<String>,
    /// `DisplayName`.
    pub display_name: Option<String>,
}

/// Value of the `xsi:type` attribute on `<Grantee>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GranteeType {
    /// Addressed by `ID` and `DisplayName`.
    #[default]
    CanonicalUser,
    /// Addressed by `URI`.
    Group,
    /// Addressed by `EmailAddress`.
    AmazonCustomerByEmail,
}

impl GranteeType {
    /// Map an attribute value; unknown values fall back to `CanonicalUser`.
    #[must_use]
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "Group" => Self::Group,
            "AmazonCustomerByEmail" => Self::AmazonCustomerByEmail,
            _ => Self::CanonicalUser,
        }
    }
}

/// `<Grantee>` of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grantee {
    /// From the `xsi:type` attribute.
    pub grantee_type: GranteeType,
    /// `ID` of a canonical user.
    pub id: Option<String>,
    /// `DisplayName` of a canonical user.
    pub display_name: Option<String>,
    /// `URI` of a group.
    pub uri: Option<String>,
    /// `EmailAddress` of a customer.
    pub email_address: Option<String>,
}

/// `<Grant>` of an access control list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grant {
    /// `Grantee`, if present.
    pub grantee: Option<Grantee>,
    /// Raw permission token, e.g. `READ_ACP`.
    pub permission: Option<String>,
}

/// `<AccessControlPolicy>` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessControlPolicy {
    /// `Owner`, if present.
    pub owner: Option<Owner>,
    /// `None` when the document has no `<AccessControlList>` element.
    pub grants: Option<Vec<Grant>>,
}
