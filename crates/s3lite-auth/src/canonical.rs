//! Canonical query strings and key path encoding.
//!
//! The same renderer feeds both the wire URL and the SigV2 canonicalized
//! resource, so identical input must always produce byte-identical output:
//!
//! ```text
//! ?name1=value1&name2&name3=value3
//! ```
//!
//! Parameters are sorted lexicographically by name. A parameter whose value
//! is empty is rendered as its bare name (`?acl`). The leading `?` is only
//! emitted when at least one parameter is present.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that must be percent-encoded in query names and values.
///
/// Everything except RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters that must be percent-encoded in an object key path.
///
/// Same as [`QUERY_ENCODE_SET`] but forward slashes are preserved.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Query parameters that S3 includes in the signed resource.
///
/// Every other parameter (`prefix`, `marker`, `max-keys`, ...) is sent on the
/// wire but left out of the string to sign. Matching is case-insensitive.
pub const SIGNED_SUB_RESOURCES: &[&str] = &[
    "versioning",
    "location",
    "acl",
    "torrent",
    "lifecycle",
    "versionid",
];

/// Render a canonical query string from name/value pairs.
///
/// Names are unique: when the same name appears more than once, the last
/// value wins. Input order never affects the output.
///
/// # Examples
///
/// ```
/// use s3lite_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(Vec::<(&str, &str)>::new()), "");
/// assert_eq!(
///     build_canonical_query_string([("prefix", "photos"), ("acl", "")]),
///     "?acl&prefix=photos"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sorted: BTreeMap<&str, &str> = params.into_iter().collect();
    if sorted.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = sorted
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                encode_query_component(name)
            } else {
                format!(
                    "{}={}",
                    encode_query_component(name),
                    encode_query_component(value)
                )
            }
        })
        .collect();

    format!("?{}", rendered.join("&"))
}

/// Render the narrower canonical query string used in the signed resource.
///
/// Only parameters listed in [`SIGNED_SUB_RESOURCES`] are kept; the rest of
/// the rendering is identical to [`build_canonical_query_string`].
///
/// # Examples
///
/// ```
/// use s3lite_auth::canonical::build_signed_query_string;
///
/// assert_eq!(
///     build_signed_query_string([("marker", "a/b"), ("acl", ""), ("prefix", "x")]),
///     "?acl"
/// );
/// ```
#[must_use]
pub fn build_signed_query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    build_canonical_query_string(
        params
            .into_iter()
            .filter(|(name, _)| is_signed_sub_resource(name)),
    )
}

/// Percent-encode an object key for use as a URL path, preserving `/`.
///
/// # Examples
///
/// ```
/// use s3lite_auth::canonical::encode_key_path;
///
/// assert_eq!(encode_key_path("/photos/my cat.jpg"), "/photos/my%20cat.jpg");
/// ```
#[must_use]
pub fn encode_key_path(key: &str) -> String {
    utf8_percent_encode(key, PATH_ENCODE_SET).to_string()
}

fn is_signed_sub_resource(name: &str) -> bool {
    SIGNED_SUB_RESOURCES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(name))
}

fn encode_query_component(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}
