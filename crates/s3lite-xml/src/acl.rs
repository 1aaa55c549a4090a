//! Conversion of an `AccessControlPolicy` document into an [`Acl`].

use s3lite_model::types::{Acl, Permission};

use crate::deserialize::from_xml_element;
use crate::error::XmlError;
use crate::types::{AccessControlPolicy, Grant, GranteeType};

/// Decode an `AccessControlPolicy` body into an [`Acl`] for `key`.
///
/// The owner's `ID` and `DisplayName` and the `AccessControlList` element are
/// required. Individual grants that cannot be attributed are skipped.
///
/// # Errors
///
/// Returns `XmlError` if the document is malformed or a required element is missing.
pub fn decode_acl(xml: &[u8], key: &str) -> Result<Acl, XmlError> {
    let policy: AccessControlPolicy = from_xml_element(xml, "AccessControlPolicy")?;
    policy_to_acl(policy, key)
}

fn policy_to_acl(policy: AccessControlPolicy, key: &str) -> Result<Acl, XmlError> {
    let owner = policy
        .owner
        .ok_or_else(|| XmlError::MissingElement("Owner".to_string()))?;
    let owner_id = owner
        .id
        .ok_or_else(|| XmlError::MissingElement("Owner/ID".to_string()))?;
    let owner_name = owner
        .display_name
        .ok_or_else(|| XmlError::MissingElement("Owner/DisplayName".to_string()))?;
    let grants = policy
        .grants
        .ok_or_else(|| XmlError::MissingElement("AccessControlList".to_string()))?;

    let key = if key.is_empty() { "/" } else { key };
    let mut acl = Acl::new(key, owner_name, owner_id);
    for grant in grants {
        apply_grant(&mut acl, grant);
    }
    Ok(acl)
}

fn apply_grant(acl: &mut Acl, grant: Grant) {
    let Some(permission) = grant.permission.as_deref().and_then(Permission::from_token) else {
        tracing::debug!(permission = ?grant.permission, "skipping grant without a known permission");
        return;
    };
    let Some(grantee) = grant.grantee else {
        tracing::debug!("skipping grant without a grantee");
        return;
    };

    match grantee.grantee_type {
        GranteeType::CanonicalUser => match (grantee.id, grantee.display_name) {
            (Some(id), Some(name)) => acl.grant_user(&id, &name, permission),
            _ => tracing::debug!("skipping canonical user grant without ID or DisplayName"),
        },
        GranteeType::Group => {
            let uri = grantee.uri.unwrap_or_default();
            if !acl.grant_group(&uri, permission) {
                tracing::debug!(%uri, "ignoring grant to unsupported group");
            }
        }
        GranteeType::AmazonCustomerByEmail => {
            tracing::debug!("skipping grant addressed by email");
        }
    }
}
