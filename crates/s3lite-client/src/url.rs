//! Virtual-hosted bucket URLs.

use s3lite_auth::{build_canonical_query_string, encode_key_path};
use s3lite_model::types::PATH_SEPARATOR;

use crate::config::ClientConfig;

/// A key resolved against the bucket and the full request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// Key with a leading `/`.
    pub key: String,
    /// `scheme://bucket.host/key?canonical-query`.
    pub url: String,
}

/// Ensure a key starts with the path separator.
///
/// # Examples
///
/// ```
/// use s3lite_client::url::resolve_key;
///
/// assert_eq!(resolve_key("photos/a.jpg"), "/photos/a.jpg");
/// assert_eq!(resolve_key(""), "/");
/// ```
#[must_use]
pub fn resolve_key(key: &str) -> String {
    if key.starts_with(PATH_SEPARATOR) {
        key.to_owned()
    } else {
        format!("{PATH_SEPARATOR}{key}")
    }
}

/// Build the request URL for `key` with the given query parameters.
///
/// The bucket is always the first label of the host; an empty bucket is
/// rejected before a request gets this far (see [`S3Request::prepare`]).
/// The output is deterministic: parameters are sorted by name, so the same
/// input always yields the same URL.
///
/// [`S3Request::prepare`]: crate::request::S3Request::prepare
#[must_use]
pub fn build_url<'a, I>(config: &ClientConfig, key: &str, params: I) -> ResolvedUrl
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let key = resolve_key(key);
    let host = config.host.trim_start_matches('.');
    let url = format!(
        "{}://{}.{host}{}{}",
        config.scheme,
        config.bucket,
        encode_key_path(&key),
        build_canonical_query_string(params)
    );
    ResolvedUrl { key, url }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_QUERY: [(&str, &str); 0] = [];

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .access_key("AKID".into())
            .secret_key("secret".into())
            .bucket("johnsmith".into())
            .build()
    }

    #[test]
    fn test_should_prepend_bucket_to_host() {
        let resolved = build_url(&config(), "photos/puppy.jpg", NO_QUERY);
        assert_eq!(resolved.key, "/photos/puppy.jpg");
        assert_eq!(
            resolved.url,
            "https://johnsmith.s3.amazonaws.com/photos/puppy.jpg"
        );
    }

    #[test]
    fn test_should_append_sorted_query() {
        let resolved = build_url(
            &config(),
            "/",
            [("prefix", "photos/"), ("max-keys", "1000"), ("delimiter", "/")],
        );
        assert_eq!(
            resolved.url,
            "https://johnsmith.s3.amazonaws.com/?delimiter=%2F&max-keys=1000&prefix=photos%2F"
        );
    }

    #[test]
    fn test_should_render_valueless_parameters() {
        let resolved = build_url(&config(), "a.txt", [("acl", "")]);
        assert_eq!(resolved.url, "https://johnsmith.s3.amazonaws.com/a.txt?acl");
    }

    #[test]
    fn test_should_be_deterministic_for_reordered_input() {
        let a = build_url(&config(), "k", [("b", "2"), ("a", "1")]);
        let b = build_url(&config(), "k", [("a", "1"), ("b", "2")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_should_encode_key_segments() {
        let resolved = build_url(&config(), "my photos/a+b.jpg", NO_QUERY);
        assert_eq!(
            resolved.url,
            "https://johnsmith.s3.amazonaws.com/my%20photos/a%2Bb.jpg"
        );
    }

    #[test]
    fn test_should_honor_scheme_and_leading_dot_host() {
        let config = ClientConfig::builder()
            .access_key("AKID".into())
            .secret_key("secret".into())
            .bucket("b".into())
            .host(".localhost:9000".into())
            .scheme("http".into())
            .build();
        let resolved = build_url(&config, "k", NO_QUERY);
        assert_eq!(resolved.url, "http://b.localhost:9000/k");
    }
}
