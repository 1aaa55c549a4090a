//! Entities decoded from S3 responses and request-side selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between key path segments.
pub const PATH_SEPARATOR: char = '/';

/// Group URI for every authenticated AWS account.
pub const AUTHENTICATED_USERS_URI: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

/// Group URI for anonymous access.
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Whether a key names a folder marker rather than an object.
#[must_use]
pub fn is_folder_key(key: &str) -> bool {
    key.ends_with(PATH_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Object {
    /// Object key.
    pub key: String,
    /// Last modification time as reported by the server.
    pub last_modified: String,
    /// Entity tag, including the surrounding quotes S3 sends.
    pub e_tag: String,
    /// Size in bytes.
    pub size: u64,
    /// Set iff the key ends with `/` and the size is zero.
    pub is_dir: bool,
}

impl S3Object {
    /// Build an object entry, deriving the directory flag.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        last_modified: impl Into<String>,
        e_tag: impl Into<String>,
        size: u64,
    ) -> Self {
        let key = key.into();
        let is_dir = is_folder_key(&key) && size == 0;
        Self {
            key,
            last_modified: last_modified.into(),
            e_tag: e_tag.into(),
            size,
            is_dir,
        }
    }
}

// ---------------------------------------------------------------------------
// ACLs
// ---------------------------------------------------------------------------

/// A single ACL permission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// All of the capabilities below.
    #[serde(rename = "FULL_CONTROL")]
    FullControl,
    /// Read the object, or list the bucket.
    #[serde(rename = "READ")]
    Read,
    /// Read the ACL.
    #[serde(rename = "READ_ACP")]
    ReadAcp,
    /// Create, overwrite and delete objects in the bucket.
    #[serde(rename = "WRITE")]
    Write,
    /// Replace the ACL.
    #[serde(rename = "WRITE_ACP")]
    WriteAcp,
}

impl Permission {
    /// Returns the wire token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullControl => "FULL_CONTROL",
            Self::Read => "READ",
            Self::ReadAcp => "READ_ACP",
            Self::Write => "WRITE",
            Self::WriteAcp => "WRITE_ACP",
        }
    }

    /// Parse a wire token. Unknown tokens yield `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "FULL_CONTROL" => Some(Self::FullControl),
            "READ" => Some(Self::Read),
            "READ_ACP" => Some(Self::ReadAcp),
            "WRITE" => Some(Self::Write),
            "WRITE_ACP" => Some(Self::WriteAcp),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities granted to one principal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclPermission {
    /// Display name of the principal.
    pub username: String,
    /// Canonical user ID, or group URI for the group slots.
    pub id: String,
    /// `FULL_CONTROL` was granted.
    pub full_control: bool,
    /// `READ` was granted.
    pub read: bool,
    /// `WRITE` was granted.
    pub write: bool,
    /// `READ_ACP` was granted.
    pub read_acp: bool,
    /// `WRITE_ACP` was granted.
    pub write_acp: bool,
}

impl AclPermission {
    /// An empty capability set for the given principal.
    #[must_use]
    pub fn new(username: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    /// OR a permission into this capability set.
    pub fn grant(&mut self, permission: Permission) {
        match permission {
            Permission::FullControl => self.full_control = true,
            Permission::Read => self.read = true,
            Permission::ReadAcp => self.read_acp = true,
            Permission::Write => self.write = true,
            Permission::WriteAcp => self.write_acp = true,
        }
    }

    /// Whether no capability is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.full_control || self.read || self.write || self.read_acp || self.write_acp)
    }
}

/// Decoded access control policy of an object or bucket.
///
/// The owner and the two well-known groups have dedicated slots; every other
/// canonical user is kept in discovery order in `user_permissions`. A
/// principal never appears twice: repeated grants are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    /// Key the ACL was fetched for (`/` for the bucket).
    pub key: String,
    /// Owner's display name.
    pub owner_name: String,
    /// Owner's canonical user ID.
    pub owner_id: String,
    /// Grants held by the owner.
    pub owner_user: AclPermission,
    /// Grants held by the `AuthenticatedUsers` group.
    pub authenticated_users: AclPermission,
    /// Grants held by the `AllUsers` group.
    pub all_users: AclPermission,
    /// Grants held by other canonical users.
    pub user_permissions: Vec<AclPermission>,
}

impl Default for Acl {
    fn default() -> Self {
        Self {
            key: String::new(),
            owner_name: String::new(),
            owner_id: String::new(),
            owner_user: AclPermission::default(),
            authenticated_users: AclPermission::new("AuthenticatedUsers", AUTHENTICATED_USERS_URI),
            all_users: AclPermission::new("AllUsers", ALL_USERS_URI),
            user_permissions: Vec::new(),
        }
    }
}

impl Acl {
    /// An empty ACL for the given owner.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        owner_name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            owner_name: owner_name.into(),
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    /// Look up a principal by canonical ID (or group URI).
    #[must_use]
    pub fn permission_by_id(&self, id: &str) -> Option<&AclPermission> {
        self.principals().find(|p| p.id == id)
    }

    /// Look up a principal by display name.
    #[must_use]
    pub fn permission_by_username(&self, username: &str) -> Option<&AclPermission> {
        self.principals().find(|p| p.username == username)
    }

    /// Record a grant to a canonical user.
    ///
    /// A known principal has the permission merged into its existing
    /// capability set. An unseen principal is placed in the owner slot when
    /// its ID is the owner ID, otherwise appended to `user_permissions`.
    pub fn grant_user(&mut self, id: &str, username: &str, permission: Permission) {
        if let Some(existing) = self.permission_by_id_mut(id) {
            existing.grant(permission);
            return;
        }

        let mut entry = AclPermission::new(username, id);
        entry.grant(permission);
        if id == self.owner_id {
            self.owner_user = entry;
        } else {
            self.user_permissions.push(entry);
        }
    }

    /// Record a grant to a group, identified by its URI.
    ///
    /// Returns `false` for groups without a dedicated slot (for example
    /// `LogDelivery`); such grants are not recorded.
    pub fn grant_group(&mut self, uri: &str, permission: Permission) -> bool {
        let slot = match uri {
            ALL_USERS_URI => &mut self.all_users,
            AUTHENTICATED_USERS_URI => &mut self.authenticated_users,
            _ => return false,
        };
        slot.grant(permission);
        true
    }

    fn principals(&self) -> impl Iterator<Item = &AclPermission> {
        [&self.owner_user, &self.authenticated_users, &self.all_users]
            .into_iter()
            .chain(self.user_permissions.iter())
    }

    fn permission_by_id_mut(&mut self, id: &str) -> Option<&mut AclPermission> {
        if self.owner_user.id == id {
            return Some(&mut self.owner_user);
        }
        if self.authenticated_users.id == id {
            return Some(&mut self.authenticated_users);
        }
        if self.all_users.id == id {
            return Some(&mut self.all_users);
        }
        self.user_permissions.iter_mut().find(|p| p.id == id)
    }
}

/// Canned ACL applied through the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    /// Send no `x-amz-acl` header.
    None,
    /// `private`
    Private,
    /// `public-read`
    PublicRead,
    /// `public-read-write`
    PublicReadWrite,
    /// `authenticated-read`
    AuthenticatedRead,
    /// `bucket-owner-read`
    BucketOwnerRead,
    /// `bucket-owner-full-control`
    #[default]
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// The `x-amz-acl` header token, or `None` when no header is sent.
    #[must_use]
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Private => Some("private"),
            Self::PublicRead => Some("public-read"),
            Self::PublicReadWrite => Some("public-read-write"),
            Self::AuthenticatedRead => Some("authenticated-read"),
            Self::BucketOwnerRead => Some("bucket-owner-read"),
            Self::BucketOwnerFullControl => Some("bucket-owner-full-control"),
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value().unwrap_or("none"))
    }
}

/// Error returned when a canned ACL token is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown canned ACL token: {0}")]
pub struct ParseCannedAclError(pub String);

impl FromStr for CannedAcl {
    type Err = ParseCannedAclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            "bucket-owner-read" => Ok(Self::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(Self::BucketOwnerFullControl),
            other => Err(ParseCannedAclError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Uploads and transfers
// ---------------------------------------------------------------------------

/// Metadata sent with an upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// `Content-Type` header; the client falls back to `binary/octet-stream`.
    pub content_type: String,
    /// `Content-Encoding` header; omitted when empty.
    pub content_encoding: String,
}

impl FileMetadata {
    /// Metadata with the given content type and no encoding.
    #[must_use]
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_encoding: String::new(),
        }
    }
}

/// Transfer progress of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Bytes transferred so far.
    pub transferred: u64,
    /// Total size, when known.
    pub total: Option<u64>,
}
