//! ACL integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use s3lite_client::{CannedAcl, FileMetadata};

    use crate::{cleanup_prefix, client, expect_success, test_prefix};

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_read_owner_acl() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("acl");
        let key = format!("{prefix}private.txt");

        expect_success(
            client
                .put(&key, Bytes::from_static(b"x"), &FileMetadata::default(), Some(CannedAcl::Private))?
                .finished()
                .await?,
        )?;

        let response = expect_success(client.get_acl(&key)?.finished().await?)?;
        let acl = response.acl().expect("acl output");
        assert_eq!(acl.key, format!("/{key}"));
        assert!(!acl.owner_id.is_empty());
        assert!(acl.owner_user.full_control);
        assert!(!acl.all_users.read);

        cleanup_prefix(&client, &prefix).await
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_apply_canned_acl() -> anyhow::Result<()> {
        let client = client();
        let prefix = test_prefix("canned");
        let key = format!("{prefix}shared.txt");

        expect_success(
            client
                .put(&key, Bytes::from_static(b"x"), &FileMetadata::default(), Some(CannedAcl::Private))?
                .finished()
                .await?,
        )?;
        expect_success(
            client
                .set_canned_acl(&key, CannedAcl::AuthenticatedRead)?
                .finished()
                .await?,
        )?;

        let response = expect_success(client.get_acl(&key)?.finished().await?)?;
        let acl = response.acl().expect("acl output");
        assert!(acl.authenticated_users.read);

        cleanup_prefix(&client, &prefix).await
    }

    #[tokio::test]
    #[ignore = "requires live S3 endpoint"]
    async fn test_should_read_bucket_acl() -> anyhow::Result<()> {
        let client = client();
        let response = expect_success(client.get_acl("/")?.finished().await?)?;
        assert_eq!(response.acl().map(|a| a.key.as_str()), Some("/"));
        Ok(())
    }
}
