//! Argument checks run before any request is built.

use s3lite_model::types::{PATH_SEPARATOR, is_folder_key};

use crate::error::ClientError;

/// Validate a key addressed by an object-level operation.
///
/// The key must be neither empty nor the root path.
///
/// # Examples
///
/// ```
/// use s3lite_client::validation::validate_object_key;
///
/// assert!(validate_object_key("photos/puppy.jpg").is_ok());
/// assert!(validate_object_key("/").is_err());
/// ```
pub fn validate_object_key(key: &str) -> Result<(), ClientError> {
    if key.is_empty() || key.chars().all(|c| c == PATH_SEPARATOR) {
        return Err(ClientError::InvalidKey {
            key: key.to_owned(),
        });
    }
    Ok(())
}

/// Validate a key that must name an object rather than a folder.
pub fn validate_file_key(key: &str) -> Result<(), ClientError> {
    validate_object_key(key)?;
    if is_folder_key(key) {
        return Err(ClientError::FolderKey {
            key: key.to_owned(),
        });
    }
    Ok(())
}

/// Validate a key that must name a folder marker.
pub fn validate_folder_key(key: &str) -> Result<(), ClientError> {
    validate_object_key(key)?;
    if !is_folder_key(key) {
        return Err(ClientError::NotAFolderKey {
            key: key.to_owned(),
        });
    }
    Ok(())
}

/// Validate that an upload carries data.
pub fn validate_payload(data: &[u8]) -> Result<(), ClientError> {
    if data.is_empty() {
        return Err(ClientError::EmptyPayload);
    }
    Ok(())
}

/// Validate a bucket name passed explicitly, e.g. a copy source.
pub fn validate_bucket(bucket: &str) -> Result<(), ClientError> {
    if bucket.trim_start_matches(PATH_SEPARATOR).is_empty() {
        return Err(ClientError::EmptyBucket);
    }
    Ok(())
}

/// Validate the bucket a request is addressed to.
pub fn validate_configured_bucket(bucket: &str) -> Result<(), ClientError> {
    if bucket.is_empty() {
        return Err(ClientError::MissingBucket);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_reject_empty_and_root_keys() {
        for key in ["", "/", "//"] {
            let err = validate_object_key(key).unwrap_err();
            assert!(matches!(err, ClientError::InvalidKey { .. }), "key {key:?}");
            assert!(err.is_precondition());
        }
        assert!(validate_object_key("a").is_ok());
        assert!(validate_object_key("/a/").is_ok());
    }

    #[test]
    fn test_should_reject_folder_keys_for_files() {
        assert!(validate_file_key("photos/puppy.jpg").is_ok());
        assert!(matches!(
            validate_file_key("photos/"),
            Err(ClientError::FolderKey { .. })
        ));
        assert!(matches!(
            validate_file_key("/"),
            Err(ClientError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_should_require_trailing_separator_for_folders() {
        assert!(validate_folder_key("photos/2024/").is_ok());
        assert!(matches!(
            validate_folder_key("photos"),
            Err(ClientError::NotAFolderKey { .. })
        ));
        assert!(validate_folder_key("/").is_err());
    }

    #[test]
    fn test_should_reject_empty_bucket() {
        assert!(matches!(validate_bucket(""), Err(ClientError::EmptyBucket)));
        assert!(validate_bucket("/").is_err());
        assert!(validate_bucket("photos").is_ok());
    }

    #[test]
    fn test_should_require_configured_bucket() {
        let err = validate_configured_bucket("").unwrap_err();
        assert!(matches!(err, ClientError::MissingBucket));
        assert!(err.is_precondition());
        assert!(validate_configured_bucket("photos").is_ok());
    }

    #[test]
    fn test_should_reject_empty_payload() {
        assert!(matches!(validate_payload(b""), Err(ClientError::EmptyPayload)));
        assert!(validate_payload(b"x").is_ok());
    }
}
