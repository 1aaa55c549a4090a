//! Bucket listing integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use s3lite_client::FileMetadata;

    use crate::{cleanup_prefix, client, expect_success, test_prefix};

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_follow_pagination() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("paginate");
        let meta = FileMetadata::default();

        let mut handles = Vec::new();
        for i in 0..7 {
            let key = format!("{prefix}item-{i:02}");
            handles.push(client.put(&key, Bytes::from_static(b"x"), &meta, None)?);
        }
        for handle in handles {
            expect_success(handle.finished().await?)?;
        }

        let listing = client.list_objects(&prefix, "", 3)?.finished().await?;
        let listing = expect_success(listing)?;
        let output = listing.list_objects().expect("listing output");
        assert_eq!(output.objects.len(), 7);
        assert_eq!(output.pages, 3);
        assert!(!output.is_truncated);
        assert!(output.objects.windows(2).all(|w| w[0].key < w[1].key));

        cleanup_prefix(&client, &prefix).await
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_group_by_delimiter() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("delimiter");
        let meta = FileMetadata::default();

        for key in ["a.txt", "photos/1.jpg", "photos/2.jpg", "docs/readme.md"] {
            let key = format!("{prefix}{key}");
            expect_success(
                client
                    .put(&key, Bytes::from_static(b"x"), &meta, None)?
                    .finished()
                    .await?,
            )?;
        }

        let listing = client.list_objects(&prefix, "/", 0)?.finished().await?;
        let listing = expect_success(listing)?;
        let output = listing.list_objects().expect("listing output");
        assert_eq!(output.objects.len(), 1);
        assert_eq!(
            output.common_prefixes,
            [format!("{prefix}docs/"), format!("{prefix}photos/")]
        );

        cleanup_prefix(&client, &prefix).await
    }
}
