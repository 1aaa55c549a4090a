//! Object upload, download, copy and delete integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use s3lite_client::{CannedAcl, ClientError, FileMetadata, S3Operation};

    use crate::{cleanup_prefix, client, expect_success, test_prefix};

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_put_and_get_object() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("putget");
        let key = format!("{prefix}greeting.txt");

        let body = Bytes::from_static(b"hello, s3lite!");
        let meta = FileMetadata::with_content_type("text/plain");
        let put = client.put(&key, body.clone(), &meta, None)?.finished().await?;
        let put = expect_success(put)?;
        assert_eq!(put.put_object().map(|o| o.progress.transferred), Some(14));

        let handle = client.get(&key)?;
        let progress = handle.progress().expect("downloads track progress");
        let got = expect_success(handle.finished().await?)?;
        assert_eq!(got.get_object().map(|o| o.data.clone()), Some(body));
        assert_eq!(progress.borrow().transferred, 14);

        cleanup_prefix(&client, &prefix).await
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_copy_object() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("copy");
        let source = format!("{prefix}source file.txt");
        let target = format!("{prefix}target.txt");

        let body = Bytes::from_static(b"copy me");
        expect_success(
            client
                .put(&source, body.clone(), &FileMetadata::default(), None)?
                .finished()
                .await?,
        )?;
        let copied = client
            .copy(&source, &target, Some(CannedAcl::Private))?
            .finished()
            .await?;
        assert_eq!(copied.operation(), S3Operation::CopyObject);
        expect_success(copied)?;

        let got = expect_success(client.get(&target)?.finished().await?)?;
        assert_eq!(got.get_object().map(|o| o.data.clone()), Some(body));

        cleanup_prefix(&client, &prefix).await
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_report_missing_object() -> anyhow::Result<()> {
        let client = client();
        let key = format!("{}missing.txt", test_prefix("missing"));

        let response = client.get(&key)?.finished().await?;
        assert!(!response.succeeded);
        assert_eq!(response.error.code, "NoSuchKey");
        assert_eq!(response.status_code.map(|s| s.as_u16()), Some(404));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_create_and_remove_folder() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("folder");
        let folder = format!("{prefix}nested/");

        expect_success(client.create_folder(&folder, None)?.finished().await?)?;
        expect_success(client.remove(&folder)?.finished().await?)?;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_reject_root_key_before_sending() {
        let client = client();
        assert!(matches!(client.get("/"), Err(ClientError::InvalidKey { .. })));
        assert_eq!(client.in_flight(), 0);
    }
}
