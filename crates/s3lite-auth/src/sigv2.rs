//! AWS Signature Version 2 request signing.
//!
//! SigV2 signs a narrow, canonicalized view of the request with HMAC-SHA1.
//! The resulting `Authorization` header has the format:
//!
//! ```text
//! AWS <AWSAccessKeyId>:<Signature>
//! ```
//!
//! Where `Signature = Base64(HMAC-SHA1(SecretKey, StringToSign))` and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                CanonicalizedAmzHeaders +
//!                CanonicalizedResource
//! ```
//!
//! Content-MD5 is never sent by this client and is always empty.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderValue;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use percent_encoding::percent_decode_str;
use sha1::Sha1;
use tracing::debug;

use crate::canonical::build_signed_query_string;
use crate::credentials::Credentials;
use crate::error::AuthError;

type HmacSha1 = Hmac<Sha1>;

/// Prefix shared by all Amazon extension headers.
const AMZ_HEADER_PREFIX: &str = "x-amz-";

/// Format a timestamp as an RFC 2616 HTTP-date.
///
/// # Examples
///
/// ```
/// use chrono::TimeZone;
/// use s3lite_auth::http_date;
///
/// let ts = chrono::Utc.with_ymd_and_hms(2007, 3, 27, 19, 36, 42).unwrap();
/// assert_eq!(http_date(ts), "Tue, 27 Mar 2007 19:36:42 GMT");
/// ```
#[must_use]
pub fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Sign a request with the current time.
///
/// Sets the `Date` and `Authorization` headers. Any `x-amz-*` headers must
/// already be present on the request, since they are part of the signature.
///
/// # Errors
///
/// Returns an [`AuthError`] if a header value cannot be represented.
pub fn sign_request<B>(
    request: &mut http::Request<B>,
    bucket: &str,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    let timestamp = http_date(Utc::now());
    sign_request_at(request, bucket, credentials, &timestamp)
}

/// Sign a request using the given `Date` header value.
///
/// # Errors
///
/// Returns an [`AuthError`] if a header value cannot be represented.
pub fn sign_request_at<B>(
    request: &mut http::Request<B>,
    bucket: &str,
    credentials: &Credentials,
    timestamp: &str,
) -> Result<(), AuthError> {
    request
        .headers_mut()
        .insert(DATE, HeaderValue::from_str(timestamp)?);

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let amz_headers = build_canonicalized_amz_headers(request.headers());
    let resource = build_canonicalized_resource(bucket, request.uri());

    let string_to_sign = build_string_to_sign(
        request.method().as_str(),
        content_type,
        timestamp,
        &amz_headers,
        &resource,
    );

    debug!(string_to_sign = ?string_to_sign, "Built SigV2 string to sign");

    let signature = compute_signature(&credentials.secret_key, &string_to_sign)?;
    let auth_header = format!("AWS {}:{signature}", credentials.access_key);
    request
        .headers_mut()
        .insert(AUTHORIZATION, HeaderValue::from_str(&auth_header)?);

    Ok(())
}

/// Assemble the SigV2 string to sign from its canonical parts.
#[must_use]
pub fn build_string_to_sign(
    method: &str,
    content_type: &str,
    date: &str,
    amz_headers: &str,
    resource: &str,
) -> String {
    format!("{method}\n\n{content_type}\n{date}\n{amz_headers}{resource}")
}

/// Build the CanonicalizedAmzHeaders string.
///
/// Every header whose name starts with `x-amz-` contributes one
/// `name:value\n` line, in the order the headers were inserted.
#[must_use]
pub fn build_canonicalized_amz_headers(headers: &http::HeaderMap) -> String {
    let mut result = String::new();
    for (name, value) in headers {
        // `HeaderName` is always lowercase.
        let name = name.as_str();
        if name.starts_with(AMZ_HEADER_PREFIX) {
            result.push_str(name);
            result.push(':');
            result.push_str(value.to_str().unwrap_or("").trim());
            result.push('\n');
        }
    }
    result
}

/// Build the CanonicalizedResource string: `/` + bucket + URL path, followed
/// by the signed sub-resource query parameters.
#[must_use]
pub fn build_canonicalized_resource(bucket: &str, uri: &http::Uri) -> String {
    let mut resource = format!("/{bucket}{}", uri.path());

    if let Some(query) = uri.query() {
        let decoded: Vec<(String, String)> = query
            .split('&')
            .filter(|s| !s.is_empty())
            .map(|param| {
                let (name, value) = param.split_once('=').unwrap_or((param, ""));
                (decode_component(name), decode_component(value))
            })
            .collect();
        resource.push_str(&build_signed_query_string(
            decoded.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        ));
    }

    resource
}

/// Compute the SigV2 signature: Base64(HMAC-SHA1(secret, string_to_sign)).
///
/// # Errors
///
/// Returns [`AuthError::InvalidSigningKey`] if the HMAC cannot be keyed.
pub fn compute_signature(secret_key: &str, string_to_sign: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|_| AuthError::InvalidSigningKey)?;
    mac.update(string_to_sign.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn decode_component(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
