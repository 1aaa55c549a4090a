//! S3 XML deserialization: parsing S3 response bodies into Rust types.
//!
//! This module provides the [`S3Deserialize`] trait and its implementations for
//! the documents the client consumes: `ListBucketResult`, `AccessControlPolicy`
//! and the flat `<Error>` document.

use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use s3lite_model::{S3Error, S3Object};

use crate::error::XmlError;
use crate::types::{
    AccessControlPolicy, Grant, Grantee, GranteeType, ListBucketResult, Owner,
};

/// Trait for deserializing S3 types from XML.
///
/// Implementors parse XML elements from the reader and populate the struct fields.
/// The root element has already been consumed by the caller; the implementation
/// reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// The reader is positioned just after the opening tag of this element.
    /// The implementation should read all child content and return when
    /// the matching end tag is consumed.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize S3 XML into a typed value, whatever the root element is called.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    read_root(xml, None)
}

/// Deserialize S3 XML into a typed value, requiring the given root element.
///
/// # Errors
///
/// Returns `XmlError::UnexpectedElement` if the root element has another name,
/// or any error from the type's deserializer.
pub fn from_xml_element<T: S3Deserialize>(xml: &[u8], root: &str) -> Result<T, XmlError> {
    read_root(xml, Some(root))
}

fn read_root<T: S3Deserialize>(xml: &[u8], expected: Option<&str>) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    // Entity references arrive as separate events; trimming would eat the
    // whitespace around them.
    reader.config_mut().trim_text(false);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some(expected) = expected {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    if tag_name != expected {
                        return Err(XmlError::UnexpectedElement(format!(
                            "expected <{expected}>, found <{tag_name}>"
                        )));
                    }
                }
                return T::deserialize_xml(&mut reader);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                let tag_name = String::from_utf8_lossy(name.as_ref()).into_owned();
                return Err(XmlError::MissingElement(format!("content of <{tag_name}>")));
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            // Skip declaration, comments, processing instructions, whitespace.
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
///
/// Expects the reader to be positioned right after a `Start` event. Entity
/// and character references are resolved.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::GeneralRef(e) => push_reference(&e, &mut text)?,
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Append the resolved value of `&name;` or `&#N;`.
fn push_reference(reference: &BytesRef<'_>, out: &mut String) -> Result<(), XmlError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|err| XmlError::ParseError(err.to_string()))?
    {
        out.push(ch);
        return Ok(());
    }

    let name = reference
        .decode()
        .map_err(|err| XmlError::ParseError(err.to_string()))?;
    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity: &{name};")))?;
    out.push_str(resolved);
    Ok(())
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Deserialize a list of items where each item is wrapped in the given element name.
fn deserialize_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?;
                if tag_name == item_tag {
                    items.push(T::deserialize_xml(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF in list".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Read the `xsi:type` attribute of a `<Grantee>` start tag.
fn grantee_type(start: &BytesStart<'_>) -> Result<GranteeType, XmlError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"type" {
            return Ok(GranteeType::from_attribute(&String::from_utf8_lossy(
                &attr.value,
            )));
        }
    }
    Ok(GranteeType::default())
}

/// Parse a boolean from XML text ("true"/"false").
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

/// Parse a u64 from XML text.
fn parse_u64(s: &str) -> Result<u64, XmlError> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid u64 '{s}': {e}")))
}

// ---------------------------------------------------------------------------
// S3Deserialize implementations
// ---------------------------------------------------------------------------

impl S3Deserialize for S3Object {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = String::new();
        let mut last_modified = String::new();
        let mut e_tag = String::new();
        let mut size = 0;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Key" => key = read_text_content(reader)?,
                        "LastModified" => last_modified = read_text_content(reader)?,
                        "ETag" => e_tag = read_text_content(reader)?,
                        "Size" => size = parse_u64(&read_text_content(reader)?)?,
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Contents".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(S3Object::new(key, last_modified, e_tag, size))
    }
}

/// `<CommonPrefixes><Prefix>..</Prefix></CommonPrefixes>`.
struct CommonPrefix(String);

impl S3Deserialize for CommonPrefix {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut prefix = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if e.local_name().as_ref() == b"Prefix" {
                        prefix = read_text_content(reader)?;
                    } else {
                        skip_element(reader)?;
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in CommonPrefixes".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(CommonPrefix(prefix))
    }
}

impl S3Deserialize for ListBucketResult {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut result = ListBucketResult::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Name" => result.name = read_text_content(reader)?,
                        "Prefix" => result.prefix = read_text_content(reader)?,
                        "Marker" => result.marker = read_text_content(reader)?,
                        "NextMarker" => result.next_marker = Some(read_text_content(reader)?),
                        "IsTruncated" => {
                            result.is_truncated = parse_bool(&read_text_content(reader)?)?;
                        }
                        "Contents" => {
                            let object = S3Object::deserialize_xml(reader)?;
                            if object.key.is_empty() {
                                tracing::debug!("skipping listing entry without a key");
                            } else {
                                result.contents.push(object);
                            }
                        }
                        "CommonPrefixes" => {
                            let CommonPrefix(prefix) = CommonPrefix::deserialize_xml(reader)?;
                            if !prefix.is_empty() {
                                result.common_prefixes.push(prefix);
                            }
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in ListBucketResult".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(result)
    }
}

impl S3Deserialize for Owner {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut id = None;
        let mut display_name = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "ID" => id = Some(read_text_content(reader)?),
                        "DisplayName" => display_name = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Owner".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Owner { id, display_name })
    }
}

impl Grantee {
    /// The grantee type lives on the start tag, which the caller has already
    /// consumed, so it is passed in rather than read here.
    fn read(reader: &mut Reader<&[u8]>, grantee_type: GranteeType) -> Result<Self, XmlError> {
        let mut grantee = Grantee {
            grantee_type,
            ..Grantee::default()
        };

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "ID" => grantee.id = Some(read_text_content(reader)?),
                        "DisplayName" => grantee.display_name = Some(read_text_content(reader)?),
                        "URI" => grantee.uri = Some(read_text_content(reader)?),
                        "EmailAddress" => {
                            grantee.email_address = Some(read_text_content(reader)?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Grantee".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(grantee)
    }
}

impl S3Deserialize for Grant {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut grantee = None;
        let mut permission = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Grantee" => {
                            let kind = grantee_type(&e)?;
                            grantee = Some(Grantee::read(reader, kind)?);
                        }
                        "Permission" => permission = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Grant".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Grant {
            grantee,
            permission,
        })
    }
}

impl S3Deserialize for AccessControlPolicy {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut owner = None;
        let mut grants = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Owner" => owner = Some(Owner::deserialize_xml(reader)?),
                        "AccessControlList" => {
                            grants = Some(deserialize_list(reader, "Grant")?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"AccessControlList" {
                        grants = Some(Vec::new());
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in AccessControlPolicy".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(AccessControlPolicy { owner, grants })
    }
}

impl S3Deserialize for S3Error {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut error = S3Error::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Code" => error.code = read_text_content(reader)?,
                        "Message" => error.message = read_text_content(reader)?,
                        "RequestId" => error.request_id = read_text_content(reader)?,
                        "Resource" => error.resource = read_text_content(reader)?,
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Error".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_list_bucket_result() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
            <Name>bucket</Name>
            <Prefix>photos/</Prefix>
            <Marker></Marker>
            <MaxKeys>1000</MaxKeys>
            <IsTruncated>true</IsTruncated>
            <Contents>
                <Key>photos/</Key>
                <LastModified>2009-10-12T17:50:30.000Z</LastModified>
                <ETag>&quot;d41d8cd98f00b204e9800998ecf8427e&quot;</ETag>
                <Size>0</Size>
                <StorageClass>STANDARD</StorageClass>
            </Contents>
            <Contents>
                <Key>photos/2006/January/sample.jpg</Key>
                <LastModified>2009-10-12T17:50:31.000Z</LastModified>
                <ETag>&quot;bf1d737a4d46a19f3bced6905cc8b902&quot;</ETag>
                <Size>142863</Size>
                <Owner><ID>abc</ID><DisplayName>owner</DisplayName></Owner>
            </Contents>
        </ListBucketResult>"#;

        let page: ListBucketResult =
            from_xml_element(xml, "ListBucketResult").expect("deserialization should succeed");
        assert_eq!(page.name, "bucket");
        assert_eq!(page.prefix, "photos/");
        assert!(page.is_truncated);
        assert_eq!(page.contents.len(), 2);

        let folder = &page.contents[0];
        assert!(folder.is_dir);
        assert_eq!(folder.e_tag, "\"d41d8cd98f00b204e9800998ecf8427e\"");

        let photo = &page.contents[1];
        assert_eq!(photo.key, "photos/2006/January/sample.jpg");
        assert_eq!(photo.last_modified, "2009-10-12T17:50:31.000Z");
        assert_eq!(photo.size, 142_863);
        assert!(!photo.is_dir);
        assert_eq!(page.last_key(), Some("photos/2006/January/sample.jpg"));
    }

    #[test]
    fn test_should_skip_contents_without_key() {
        let xml = br"<ListBucketResult>
            <IsTruncated>false</IsTruncated>
            <Contents><Size>3</Size></Contents>
            <Contents><Key>a</Key><Size>3</Size></Contents>
        </ListBucketResult>";

        let page: ListBucketResult = from_xml(xml).expect("deserialization should succeed");
        assert_eq!(page.contents.len(), 1);
        assert_eq!(page.contents[0].key, "a");
    }

    #[test]
    fn test_should_deserialize_common_prefixes() {
        let xml = br"<ListBucketResult>
            <Prefix></Prefix>
            <Delimiter>/</Delimiter>
            <NextMarker>b/</NextMarker>
            <IsTruncated>false</IsTruncated>
            <CommonPrefixes><Prefix>a/</Prefix></CommonPrefixes>
            <CommonPrefixes><Prefix>b/</Prefix></CommonPrefixes>
        </ListBucketResult>";

        let page: ListBucketResult = from_xml(xml).expect("deserialization should succeed");
        assert!(page.contents.is_empty());
        assert_eq!(page.common_prefixes, ["a/", "b/"]);
        assert_eq!(page.next_marker.as_deref(), Some("b/"));
        assert_eq!(page.last_key(), None);
    }

    #[test]
    fn test_should_resolve_entities_in_keys() {
        let xml = br"<ListBucketResult>
            <Contents><Key>a &amp; b&#47;c</Key><Size>1</Size></Contents>
        </ListBucketResult>";

        let page: ListBucketResult = from_xml(xml).expect("deserialization should succeed");
        assert_eq!(page.contents[0].key, "a & b/c");
    }

    #[test]
    fn test_should_reject_invalid_truncation_flag() {
        let xml = br"<ListBucketResult><IsTruncated>maybe</IsTruncated></ListBucketResult>";
        let err = from_xml::<ListBucketResult>(xml).unwrap_err();
        assert!(matches!(err, XmlError::ParseError(_)));
    }

    #[test]
    fn test_should_reject_unexpected_root_element() {
        let xml = br"<Error><Code>AccessDenied</Code></Error>";
        let err = from_xml_element::<ListBucketResult>(xml, "ListBucketResult").unwrap_err();
        assert!(matches!(err, XmlError::UnexpectedElement(_)));
    }

    #[test]
    fn test_should_reject_truncated_document() {
        let xml = br"<ListBucketResult><Contents><Key>a</Key>";
        assert!(from_xml::<ListBucketResult>(xml).is_err());
    }

    #[test]
    fn test_should_reject_empty_body() {
        let err = from_xml::<ListBucketResult>(b"").unwrap_err();
        assert!(matches!(err, XmlError::MissingElement(_)));
    }

    #[test]
    fn test_should_deserialize_error_document() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <Error>
            <Code>NoSuchKey</Code>
            <Message>The resource you requested does not exist</Message>
            <Resource>/mybucket/myfoto.jpg</Resource>
            <RequestId>4442587FB7D0A2F9</RequestId>
        </Error>"#;

        let error: S3Error = from_xml_element(xml, "Error").expect("deserialization should succeed");
        assert_eq!(error.code, "NoSuchKey");
        assert_eq!(error.message, "The resource you requested does not exist");
        assert_eq!(error.resource, "/mybucket/myfoto.jpg");
        assert_eq!(error.request_id, "4442587FB7D0A2F9");
        assert!(error.internal.is_empty());
    }

    #[test]
    fn test_should_deserialize_access_control_policy() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <AccessControlPolicy xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
            <Owner>
                <ID>owner-id</ID>
                <DisplayName>owner</DisplayName>
            </Owner>
            <AccessControlList>
                <Grant>
                    <Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="CanonicalUser">
                        <ID>owner-id</ID>
                        <DisplayName>owner</DisplayName>
                    </Grantee>
                    <Permission>FULL_CONTROL</Permission>
                </Grant>
                <Grant>
                    <Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="Group">
                        <URI>http://acs.amazonaws.com/groups/global/AllUsers</URI>
                    </Grantee>
                    <Permission>READ</Permission>
                </Grant>
            </AccessControlList>
        </AccessControlPolicy>"#;

        let policy: AccessControlPolicy = from_xml(xml).expect("deserialization should succeed");
        let owner = policy.owner.expect("owner present");
        assert_eq!(owner.id.as_deref(), Some("owner-id"));
        assert_eq!(owner.display_name.as_deref(), Some("owner"));

        let grants = policy.grants.expect("grants present");
        assert_eq!(grants.len(), 2);
        let first = grants[0].grantee.as_ref().expect("grantee present");
        assert_eq!(first.grantee_type, GranteeType::CanonicalUser);
        assert_eq!(grants[0].permission.as_deref(), Some("FULL_CONTROL"));

        let group = grants[1].grantee.as_ref().expect("grantee present");
        assert_eq!(group.grantee_type, GranteeType::Group);
        assert_eq!(
            group.uri.as_deref(),
            Some("http://acs.amazonaws.com/groups/global/AllUsers")
        );
    }

    #[test]
    fn test_should_distinguish_missing_and_empty_access_control_list() {
        let missing = br"<AccessControlPolicy><Owner><ID>a</ID></Owner></AccessControlPolicy>";
        let policy: AccessControlPolicy = from_xml(missing).expect("deserialization should succeed");
        assert!(policy.grants.is_none());

        let empty = br"<AccessControlPolicy><AccessControlList/></AccessControlPolicy>";
        let policy: AccessControlPolicy = from_xml(empty).expect("deserialization should succeed");
        assert_eq!(policy.grants, Some(Vec::new()));
    }
}
