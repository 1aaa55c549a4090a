//! The asynchronous dispatcher.
//!
//! [`S3Client`] validates arguments, signs requests and hands them to a
//! [`Transport`]. Each transport task reports back on a channel drained by a
//! single driver task, which looks the request up in the correlation
//! registry, decodes the body, and either finalizes the response or, for a
//! truncated listing, reissues the request for the next page.
//!
//! ```text
//! caller ──> S3Client::get ──> sign ──> Registry::insert ──> Transport
//!                                                              │
//! caller <── oneshot <── finalize <── driver <── mpsc <────────┘
//!                                       │
//!                                       └──> next listing page ──> Transport
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderValue};
use parking_lot::RwLock;
use s3lite_auth::encode_key_path;
use s3lite_model::{
    CannedAcl, FileMetadata, GetAclOutput, GetObjectOutput, OperationId, Progress,
    PutObjectOutput, ResponsePayload, S3Error, S3Operation, S3Response,
};
use s3lite_xml::{XmlError, decode_acl, decode_error, decode_list_page};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, normalize_bucket};
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::handle::ResponseHandle;
use crate::registry::{PendingOperation, Registry, RequestHandle};
use crate::request::{S3Request, X_AMZ_ACL, X_AMZ_COPY_SOURCE};
use crate::transport::{
    ProgressReporter, ReqwestTransport, TransferDirection, Transport, TransportError,
    TransportResponse,
};
use crate::url::resolve_key;
use crate::validation::{
    validate_bucket, validate_configured_bucket, validate_file_key, validate_folder_key,
    validate_object_key, validate_payload,
};

/// `Content-Type` sent with uploads that do not specify one.
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

/// Conventional page size for [`S3Client::list_objects`].
pub const DEFAULT_MAX_KEYS: u32 = 1000;

const EVENT_CAPACITY: usize = 64;

/// Asynchronous S3 client.
///
/// Must be created inside a Tokio runtime. Any number of operations may be in
/// flight at once. Dropping the client aborts them all: their handles resolve
/// to [`ClientError::Cancelled`] and no events are emitted for them.
///
/// # Examples
///
/// ```no_run
/// use s3lite_client::{ClientConfig, S3Client};
///
/// # async fn run() -> Result<(), s3lite_client::ClientError> {
/// let client = S3Client::new(ClientConfig::from_env());
/// let response = client.list_objects("photos/", "", 1000)?.finished().await?;
/// if let Some(listing) = response.list_objects() {
///     for object in &listing.objects {
///         println!("{} {}", object.key, object.size);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct S3Client {
    inner: Arc<ClientInner>,
    driver: AbortHandle,
}

struct ClientInner {
    config: RwLock<ClientConfig>,
    transport: Arc<dyn Transport>,
    registry: Registry,
    completions: mpsc::UnboundedSender<Completion>,
    events: broadcast::Sender<ClientEvent>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// A transport task's report for one request.
struct Completion {
    handle: RequestHandle,
    result: Result<TransportResponse, TransportError>,
}

/// What to do with a pending operation after one exchange.
enum Step {
    Succeed,
    Fail(S3Error),
    Continue(http::Request<Bytes>),
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client")
            .field("config", &*self.inner.config.read())
            .field("in_flight", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl S3Client {
    /// A client using [`ReqwestTransport`].
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// A client using the given transport.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn with_transport(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        config.bucket = normalize_bucket(&config.bucket);
        let (completions, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let inner = Arc::new(ClientInner {
            config: RwLock::new(config),
            transport,
            registry: Registry::default(),
            completions,
            events,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });
        let driver = tokio::spawn(drive(Arc::clone(&inner), receiver)).abort_handle();

        Self { inner, driver }
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.inner.config.read().clone()
    }

    /// The bucket subsequent operations address.
    #[must_use]
    pub fn bucket(&self) -> String {
        self.inner.config.read().bucket.clone()
    }

    /// Change the bucket. Operations already in flight, including listings
    /// still fetching pages, keep the bucket they were issued with.
    pub fn set_bucket(&self, bucket: &str) {
        let bucket = normalize_bucket(bucket);
        info!(%bucket, "switching bucket");
        self.inner.config.write().bucket = bucket;
    }

    /// Receive a [`ClientEvent`] for every operation that finishes from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Number of requests currently awaiting the transport.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.registry.len()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// List the bucket, following pagination until the listing is complete.
    ///
    /// Empty `prefix`/`delimiter` and a zero `max_keys` are not sent.
    pub fn list_objects(
        &self,
        prefix: &str,
        delimiter: &str,
        max_keys: u32,
    ) -> Result<ResponseHandle, ClientError> {
        let mut request = S3Request::new(S3Operation::ListObjects, "/");
        if !prefix.is_empty() {
            request.set_query("prefix", prefix);
        }
        if !delimiter.is_empty() {
            request.set_query("delimiter", delimiter);
        }
        if max_keys > 0 {
            request.set_query("max-keys", max_keys.to_string());
        }
        self.issue(request)
    }

    /// Download an object.
    pub fn get(&self, key: &str) -> Result<ResponseHandle, ClientError> {
        check(S3Operation::GetObject, key, validate_file_key(key))?;
        self.issue(S3Request::new(S3Operation::GetObject, key))
    }

    /// Upload an object. `acl` falls back to the configured default.
    pub fn put(
        &self,
        key: &str,
        data: Bytes,
        metadata: &FileMetadata,
        acl: Option<CannedAcl>,
    ) -> Result<ResponseHandle, ClientError> {
        check(
            S3Operation::PutObject,
            key,
            validate_file_key(key).and_then(|()| validate_payload(&data)),
        )?;

        let content_type = if metadata.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            metadata.content_type.as_str()
        };
        let mut request = S3Request::new(S3Operation::PutObject, key)
            .with_header(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        if !metadata.content_encoding.is_empty() {
            request = request.with_header(
                CONTENT_ENCODING,
                HeaderValue::from_str(&metadata.content_encoding)?,
            );
        }
        let request = self.with_canned_acl(request, acl).with_body(data);
        self.issue(request)
    }

    /// Create a folder marker: an empty object whose key ends with `/`.
    pub fn create_folder(
        &self,
        key: &str,
        acl: Option<CannedAcl>,
    ) -> Result<ResponseHandle, ClientError> {
        check(S3Operation::PutObject, key, validate_folder_key(key))?;
        let request = self.with_canned_acl(S3Request::new(S3Operation::PutObject, key), acl);
        self.issue(request)
    }

    /// Delete an object or folder marker.
    pub fn remove(&self, key: &str) -> Result<ResponseHandle, ClientError> {
        check(S3Operation::RemoveObject, key, validate_object_key(key))?;
        self.issue(S3Request::new(S3Operation::RemoveObject, key))
    }

    /// Copy an object within the current bucket.
    pub fn copy(
        &self,
        source_key: &str,
        destination_key: &str,
        acl: Option<CannedAcl>,
    ) -> Result<ResponseHandle, ClientError> {
        let bucket = self.bucket();
        self.copy_from_bucket(&bucket, source_key, destination_key, acl)
    }

    /// Copy an object from `source_bucket` into the current bucket.
    pub fn copy_from_bucket(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_key: &str,
        acl: Option<CannedAcl>,
    ) -> Result<ResponseHandle, ClientError> {
        check(
            S3Operation::CopyObject,
            destination_key,
            validate_bucket(source_bucket)
                .and_then(|()| validate_file_key(source_key))
                .and_then(|()| validate_file_key(destination_key)),
        )?;

        let copy_source = format!(
            "/{}{}",
            normalize_bucket(source_bucket),
            encode_key_path(&resolve_key(source_key))
        );
        let request = S3Request::new(S3Operation::CopyObject, destination_key)
            .with_header(X_AMZ_COPY_SOURCE, HeaderValue::from_str(&copy_source)?);
        let request = self.with_canned_acl(request, acl);
        self.issue(request)
    }

    /// Read the ACL of an object, or of the bucket for `/`.
    pub fn get_acl(&self, key: &str) -> Result<ResponseHandle, ClientError> {
        self.issue(S3Request::new(S3Operation::GetAcl, key).with_query("acl", ""))
    }

    /// Replace the ACL of an object with a canned ACL.
    pub fn set_canned_acl(&self, key: &str, acl: CannedAcl) -> Result<ResponseHandle, ClientError> {
        let token = check(
            S3Operation::SetAcl,
            key,
            validate_object_key(key)
                .and_then(|()| acl.header_value().ok_or(ClientError::MissingCannedAcl)),
        )?;
        let request = S3Request::new(S3Operation::SetAcl, key)
            .with_query("acl", "")
            .with_header(X_AMZ_ACL, HeaderValue::from_static(token));
        self.issue(request)
    }

    // -----------------------------------------------------------------------
    // Issuing
    // -----------------------------------------------------------------------

    fn with_canned_acl(&self, request: S3Request, acl: Option<CannedAcl>) -> S3Request {
        let acl = acl.unwrap_or_else(|| self.inner.config.read().default_canned_acl);
        match acl.header_value() {
            Some(token) => request.with_header(X_AMZ_ACL, HeaderValue::from_static(token)),
            None => request,
        }
    }

    fn issue(&self, request: S3Request) -> Result<ResponseHandle, ClientError> {
        let config = self.config();
        check(
            request.operation,
            &request.key,
            validate_configured_bucket(&config.bucket),
        )?;
        let (resolved, http_request) = request.prepare(&config)?;
        let id = OperationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let operation = request.operation;

        let (reporter, progress) = match operation {
            S3Operation::GetObject => tracked(TransferDirection::Download),
            S3Operation::PutObject => tracked(TransferDirection::Upload),
            _ => (ProgressReporter::disabled(), None),
        };
        let (notifier, receiver) = oneshot::channel();
        let response = S3Response::new(id, operation, &resolved.key, &resolved.url);
        let pending = PendingOperation::new(config, request, response, notifier);

        debug!(%id, %operation, key = %resolved.key, "issuing request");
        self.inner.dispatch(pending, http_request, reporter);

        Ok(ResponseHandle {
            id,
            operation,
            key: resolved.key,
            url: resolved.url,
            receiver,
            progress,
        })
    }
}

impl Drop for S3Client {
    fn drop(&mut self) {
        self.inner.closed.store(true, Ordering::Release);
        self.driver.abort();
        let cancelled = self.inner.registry.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "client dropped with operations in flight");
        }
    }
}

fn tracked(direction: TransferDirection) -> (ProgressReporter, Option<watch::Receiver<Progress>>) {
    let (tx, rx) = watch::channel(Progress::default());
    (ProgressReporter::new(tx, direction), Some(rx))
}

/// Log a failed precondition before handing it back to the caller.
fn check<T>(
    operation: S3Operation,
    key: &str,
    result: Result<T, ClientError>,
) -> Result<T, ClientError> {
    result.inspect_err(|err| warn!(%operation, key, %err, "precondition failed; request not sent"))
}

async fn drive(inner: Arc<ClientInner>, mut completions: mpsc::UnboundedReceiver<Completion>) {
    while let Some(completion) = completions.recv().await {
        inner.on_completion(completion);
    }
}

impl ClientInner {
    fn dispatch(
        &self,
        pending: PendingOperation,
        request: http::Request<Bytes>,
        progress: ProgressReporter,
    ) {
        let handle = self.registry.insert(pending);
        let future = self.transport.execute(request, progress);
        let completions = self.completions.clone();
        let task = tokio::spawn(async move {
            let result = future.await;
            if completions.send(Completion { handle, result }).is_err() {
                debug!("dispatcher stopped; dropping completion");
            }
        });
        self.registry.attach_task(handle, task.abort_handle());
    }

    fn on_completion(&self, completion: Completion) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        let Completion { handle, result } = completion;
        let Some(mut pending) = self.registry.take(handle) else {
            error!(handle = handle.0, "completion does not match any pending operation");
            self.emit(ClientEvent::InternalError {
                message: format!("no pending operation for request handle {}", handle.0),
            });
            return;
        };

        let step = match result {
            Err(err) => {
                warn!(key = %pending.response.key, %err, "transport failed");
                Step::Fail(S3Error::internal(format!("network error: {err}")))
            }
            Ok(response) => process(&mut pending, response),
        };

        match step {
            Step::Continue(request) => {
                self.dispatch(pending, request, ProgressReporter::disabled());
            }
            Step::Succeed => self.finalize(pending, None),
            Step::Fail(error) => self.finalize(pending, Some(error)),
        }
    }

    fn finalize(&self, pending: PendingOperation, failure: Option<S3Error>) {
        let PendingOperation {
            mut response,
            notifier,
            ..
        } = pending;

        let transition = match failure {
            None => response.succeed(),
            Some(error) => response.fail(error),
        };
        if let Err(err) = transition {
            error!(%err, "response finalized twice");
            self.emit(ClientEvent::InternalError {
                message: err.to_string(),
            });
            return;
        }

        let operation = response.operation();
        let event = if response.succeeded {
            info!(id = %response.id, %operation, key = %response.key, status = ?response.status_code, "operation succeeded");
            ClientEvent::Finished {
                id: response.id,
                operation,
                key: response.key.clone(),
            }
        } else {
            warn!(id = %response.id, %operation, key = %response.key, status = ?response.status_code, error = %response.error, "operation failed");
            ClientEvent::Failed {
                id: response.id,
                operation,
                key: response.key.clone(),
                error: response.error.clone(),
            }
        };

        if notifier.send(response).is_err() {
            debug!(%operation, "response handle dropped before completion");
        }
        self.emit(event);
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Classify one completed exchange.
fn process(pending: &mut PendingOperation, response: TransportResponse) -> Step {
    let TransportResponse { status, body, .. } = response;
    pending.response.status_code = Some(status);

    if !status.is_success() {
        return Step::Fail(decode_failure(status, &body));
    }

    let operation = pending.response.operation();
    if operation.expects_xml_body() && body.is_empty() {
        error!(%operation, "empty body where an XML document is required");
        return Step::Fail(S3Error::internal(
            "failed to parse XML response: empty body",
        ));
    }

    match operation {
        S3Operation::ListObjects => process_list_page(pending, &body),
        S3Operation::GetAcl => match decode_acl(&body, &pending.request.key) {
            Ok(acl) => {
                pending.response.payload = ResponsePayload::GetAcl(GetAclOutput { acl });
                Step::Succeed
            }
            Err(err) => parse_failure(&err),
        },
        S3Operation::GetObject => {
            let progress = complete(&body);
            pending.response.payload =
                ResponsePayload::GetObject(GetObjectOutput { data: body, progress });
            Step::Succeed
        }
        S3Operation::PutObject => {
            let progress = complete(&pending.request.body);
            pending.response.payload = ResponsePayload::PutObject(PutObjectOutput { progress });
            Step::Succeed
        }
        // A copy can fail after the 200 status line has been sent, in which
        // case the body is an error document.
        S3Operation::CopyObject => match decode_error(&body) {
            Ok(error) if !error.code.is_empty() => Step::Fail(error),
            _ => Step::Succeed,
        },
        S3Operation::RemoveObject | S3Operation::SetAcl => Step::Succeed,
    }
}

fn process_list_page(pending: &mut PendingOperation, body: &[u8]) -> Step {
    let page = match decode_list_page(body) {
        Ok(page) => page,
        Err(err) => return parse_failure(&err),
    };

    // An empty page ends the listing even when it claims truncation.
    let empty = page.contents.is_empty() && page.common_prefixes.is_empty();

    // NextMarker is only sent with a delimiter, where the last key may sit
    // inside a common prefix.
    let next_marker = page
        .next_marker
        .clone()
        .filter(|m| !m.is_empty())
        .or_else(|| page.last_key().map(str::to_owned));
    let truncated = page.is_truncated;

    if let ResponsePayload::ListObjects(output) = &mut pending.response.payload {
        if output.pages == 0 {
            output.prefix = page.prefix;
        }
        output.pages += 1;
        output.is_truncated = truncated;
        output.objects.extend(page.contents);
        output.common_prefixes.extend(page.common_prefixes);
    }

    if !truncated {
        return Step::Succeed;
    }
    if empty {
        debug!(key = %pending.response.key, "truncated listing returned an empty page; stopping");
        return Step::Succeed;
    }
    let Some(marker) = next_marker else {
        warn!(key = %pending.response.key, "truncated listing page carries no marker; stopping");
        return Step::Succeed;
    };
    if pending.request.query.get("marker") == Some(&marker) {
        warn!(%marker, "listing marker did not advance; stopping");
        return Step::Succeed;
    }

    pending.request.set_query("marker", marker.clone());
    let (resolved, request) = match pending.request.prepare(&pending.config) {
        Ok(prepared) => prepared,
        Err(err) => {
            return Step::Fail(S3Error::internal(format!(
                "failed to prepare next listing page: {err}"
            )));
        }
    };
    if let Err(err) = pending.response.mark_continuing() {
        return Step::Fail(S3Error::internal(err.to_string()));
    }
    pending.response.url = resolved.url;

    debug!(id = %pending.response.id, %marker, "requesting next listing page");
    Step::Continue(request)
}

/// Build the error of a non-2xx response, decoding the body when possible.
fn decode_failure(status: http::StatusCode, body: &[u8]) -> S3Error {
    let mut error = if body.is_empty() {
        S3Error::default()
    } else {
        decode_error(body).unwrap_or_else(|err| {
            error!(%status, %err, "failed to decode S3 error document");
            S3Error::default()
        })
    };
    if error.code.is_empty() {
        error.internal = format!("HTTP {status}");
    }
    error
}

fn parse_failure(err: &XmlError) -> Step {
    error!(%err, "failed to parse XML response");
    Step::Fail(S3Error::internal(format!(
        "failed to parse XML response: {err}"
    )))
}

fn complete(body: &[u8]) -> Progress {
    let size = u64::try_from(body.len()).unwrap_or(u64::MAX);
    Progress {
        transferred: size,
        total: Some(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportFuture;

    /// Never completes; completions are injected by hand.
    struct StalledTransport;

    impl Transport for StalledTransport {
        fn execute(
            &self,
            _request: http::Request<Bytes>,
            _progress: ProgressReporter,
        ) -> TransportFuture {
            Box::pin(std::future::pending())
        }
    }

    fn client() -> S3Client {
        let config = ClientConfig::builder()
            .access_key("AKID".into())
            .secret_key("secret".into())
            .bucket("/photos".into())
            .build();
        S3Client::with_transport(config, Arc::new(StalledTransport))
    }

    #[tokio::test]
    async fn test_should_report_unknown_completion_as_internal_error() {
        let client = client();
        let mut events = client.subscribe();

        client
            .inner
            .completions
            .send(Completion {
                handle: RequestHandle(u64::MAX),
                result: Err(TransportError::Connection("reset".into())),
            })
            .map_err(|_| "send failed")
            .unwrap();

        let event = events.recv().await.unwrap();
        assert!(matches!(event, ClientEvent::InternalError { .. }));
        assert_eq!(event.operation(), None);
    }

    #[tokio::test]
    async fn test_should_normalize_and_switch_bucket() {
        let client = client();
        assert_eq!(client.bucket(), "photos");

        client.set_bucket("/videos");
        assert_eq!(client.bucket(), "videos");

        let handle = client.get("clip.mp4").unwrap();
        assert_eq!(handle.url(), "https://videos.s3.amazonaws.com/clip.mp4");
    }

    #[tokio::test]
    async fn test_should_track_in_flight_requests() {
        let client = client();
        let _a = client.get("a.jpg").unwrap();
        let _b = client.remove("b.jpg").unwrap();
        assert_eq!(client.in_flight(), 2);
    }

    #[test]
    fn test_should_keep_raw_status_when_error_body_is_missing() {
        let error = decode_failure(http::StatusCode::FORBIDDEN, b"");
        assert!(error.code.is_empty());
        assert_eq!(error.internal, "HTTP 403 Forbidden");
    }

    #[test]
    fn test_should_keep_raw_status_when_error_body_is_not_xml() {
        let error = decode_failure(http::StatusCode::BAD_GATEWAY, b"<html>oops");
        assert_eq!(error.internal, "HTTP 502 Bad Gateway");
    }
}
