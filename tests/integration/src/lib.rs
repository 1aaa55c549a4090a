//! Integration tests for the s3lite client against a live S3 endpoint.
//!
//! The endpoint, bucket and credentials come from the environment (see
//! [`ClientConfig::from_env`]). The bucket must already exist; every test
//! works under its own random key prefix and removes what it wrote.
//! The tests are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! AWS_ACCESS_KEY_ID=.. AWS_SECRET_ACCESS_KEY=.. S3_BUCKET=.. \
//!     cargo test -p s3lite-integration -- --ignored
//! ```

use std::sync::Once;

use anyhow::{Context, bail};
use s3lite_client::{ClientConfig, S3Client, S3Response};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Create a client configured from the environment.
#[must_use]
pub fn client() -> S3Client {
    init_tracing();
    S3Client::new(ClientConfig::from_env())
}

/// Generate a unique key prefix for a test, ending with `/`.
#[must_use]
pub fn test_prefix(name: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("s3lite-test/{name}-{id}/")
}

/// Turn a finished response into an error unless it succeeded.
///
/// # Errors
///
/// Returns the response's operation, key and error when it failed.
pub fn expect_success(response: S3Response) -> anyhow::Result<S3Response> {
    if !response.succeeded {
        bail!(
            "{} {} failed: {}",
            response.operation(),
            response.key,
            response.error
        );
    }
    Ok(response)
}

/// Delete every object under `prefix`.
///
/// # Errors
///
/// Fails when the prefix cannot be listed.
pub async fn cleanup_prefix(client: &S3Client, prefix: &str) -> anyhow::Result<()> {
    let listing = client.list_objects(prefix, "", 0)?.finished().await?;
    let listing = expect_success(listing)?;
    let objects = listing
        .list_objects()
        .context("listing response without listing output")?
        .objects
        .clone();

    for object in objects {
        let response = client.remove(&object.key)?.finished().await?;
        if !response.succeeded {
            tracing::warn!(key = %object.key, error = %response.error, "cleanup failed");
        }
    }
    Ok(())
}

mod test_acl;
mod test_list;
mod test_object;
