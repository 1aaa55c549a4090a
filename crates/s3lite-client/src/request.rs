//! Request preparation: query, headers, body, URL and signature.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HeaderName, HeaderValue};
use s3lite_auth::{Credentials, sign_request};
use s3lite_model::S3Operation;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::url::{ResolvedUrl, build_url, resolve_key};
use crate::validation::validate_configured_bucket;

/// `x-amz-acl` request header.
pub const X_AMZ_ACL: HeaderName = HeaderName::from_static("x-amz-acl");

/// `x-amz-copy-source` request header.
pub const X_AMZ_COPY_SOURCE: HeaderName = HeaderName::from_static("x-amz-copy-source");

/// An unsigned request for one operation.
///
/// Kept by the dispatcher while the operation is in flight so that a
/// listing can be re-signed and reissued with a new `marker`.
#[derive(Debug, Clone)]
pub struct S3Request {
    /// Operation the request performs.
    pub operation: S3Operation,
    /// Key with a leading `/`.
    pub key: String,
    /// Query parameters, unique by name.
    pub query: BTreeMap<String, String>,
    /// Headers in insertion order, including `x-amz-*` extensions.
    pub headers: http::HeaderMap,
    /// Request body; empty for everything but uploads.
    pub body: Bytes,
}

impl S3Request {
    /// A request for `key` with no query, headers or body.
    #[must_use]
    pub fn new(operation: S3Operation, key: &str) -> Self {
        Self {
            operation,
            key: resolve_key(key),
            query: BTreeMap::new(),
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a query parameter; an empty value renders as a bare name.
    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_query(name, value);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Set or replace a query parameter.
    pub fn set_query(&mut self, name: &str, value: impl Into<String>) {
        self.query.insert(name.to_owned(), value.into());
    }

    /// Resolve the URL against the given configuration.
    #[must_use]
    pub fn resolve(&self, config: &ClientConfig) -> ResolvedUrl {
        build_url(
            config,
            &self.key,
            self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Build the wire request and sign it with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingBucket`] when no bucket is configured,
    /// or another [`ClientError`] if the URL or a header is not valid HTTP,
    /// or signing fails.
    pub fn prepare(
        &self,
        config: &ClientConfig,
    ) -> Result<(ResolvedUrl, http::Request<Bytes>), ClientError> {
        validate_configured_bucket(&config.bucket)?;
        let resolved = self.resolve(config);
        let mut request = http::Request::builder()
            .method(self.operation.method())
            .uri(resolved.url.as_str())
            .body(self.body.clone())?;

        request.headers_mut().extend(self.headers.clone());
        if self.operation.method() == http::Method::PUT {
            request
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        }

        let credentials = Credentials::new(config.access_key.clone(), config.secret_key.clone());
        sign_request(&mut request, &config.bucket, &credentials)?;

        tracing::debug!(
            operation = %self.operation,
            method = %request.method(),
            url = %resolved.url,
            "prepared signed request"
        );
        Ok((resolved, request))
    }
}
