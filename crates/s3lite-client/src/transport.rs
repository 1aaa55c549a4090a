//! The HTTP transport seam.
//!
//! The dispatcher never talks to the network directly: it hands signed
//! requests to a [`Transport`] and is told when each one completes. Any HTTP
//! client can be plugged in; [`ReqwestTransport`] is the default.

use std::future::Future;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use s3lite_model::Progress;
use tokio::sync::watch;

/// A completed HTTP exchange. Any status, including errors, is a completion.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: http::StatusCode,
    /// Response headers.
    pub headers: http::HeaderMap,
    /// Full response body.
    pub body: Bytes,
}

/// Connection-level failures: no HTTP response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be converted for the underlying client.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connecting, sending, or receiving the response head failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body was cut short.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Future returned by [`Transport::execute`].
pub type TransportFuture =
    Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send>>;

/// Executes signed requests.
///
/// # Object Safety
///
/// The returned future is boxed so the dispatcher can hold an
/// `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// Send `request` and resolve once the full response body is read.
    ///
    /// Implementations report bytes sent and received through `progress`.
    fn execute(&self, request: http::Request<Bytes>, progress: ProgressReporter)
    -> TransportFuture;
}

/// Which side of the exchange a [`ProgressReporter`] publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Request body bytes.
    Upload,
    /// Response body bytes.
    Download,
}

/// Publishes transfer progress of one request to its response handle.
///
/// Reports for the other direction are ignored, so transports can report
/// both sides unconditionally.
#[derive(Debug)]
pub struct ProgressReporter {
    sender: Option<watch::Sender<Progress>>,
    direction: TransferDirection,
}

impl ProgressReporter {
    /// A reporter publishing `direction` to `sender`.
    #[must_use]
    pub fn new(sender: watch::Sender<Progress>, direction: TransferDirection) -> Self {
        Self {
            sender: Some(sender),
            direction,
        }
    }

    /// A reporter that discards every report.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            sender: None,
            direction: TransferDirection::Download,
        }
    }

    /// Report request body bytes sent so far.
    pub fn uploaded(&self, sent: u64, total: Option<u64>) {
        if self.direction == TransferDirection::Upload {
            self.publish(sent, total);
        }
    }

    /// Report response body bytes received so far.
    pub fn downloaded(&self, received: u64, total: Option<u64>) {
        if self.direction == TransferDirection::Download {
            self.publish(received, total);
        }
    }

    fn publish(&self, transferred: u64, total: Option<u64>) {
        if let Some(sender) = &self.sender {
            sender.send_replace(Progress { transferred, total });
        }
    }
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
///
/// Response bodies are read chunk by chunk to report download progress.
/// Request bodies are sent in one piece, so upload progress jumps from zero
/// to the full size once the response head arrives.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// A transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport using the given client, e.g. one with custom timeouts.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: http::Request<Bytes>,
        progress: ProgressReporter,
    ) -> TransportFuture {
        let client = self.client.clone();
        Box::pin(async move {
            let upload_total = byte_len(request.body());
            progress.uploaded(0, Some(upload_total));

            let request = reqwest::Request::try_from(request)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            let mut response = client
                .execute(request)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            progress.uploaded(upload_total, Some(upload_total));

            let status = response.status();
            let headers = response.headers().clone();
            let total = response.content_length();
            let mut body = BytesMut::new();
            progress.downloaded(0, total);
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
            {
                body.extend_from_slice(&chunk);
                progress.downloaded(byte_len(&body), total);
            }

            Ok(TransportResponse {
                status,
                headers,
                body: body.freeze(),
            })
        })
    }
}

fn byte_len(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_publish_matching_direction_only() {
        let (tx, rx) = watch::channel(Progress::default());
        let reporter = ProgressReporter::new(tx, TransferDirection::Download);

        reporter.uploaded(10, Some(10));
        assert_eq!(*rx.borrow(), Progress::default());

        reporter.downloaded(4, Some(8));
        assert_eq!(
            *rx.borrow(),
            Progress {
                transferred: 4,
                total: Some(8)
            }
        );
    }

    #[test]
    fn test_should_ignore_reports_when_disabled() {
        let reporter = ProgressReporter::disabled();
        reporter.uploaded(1, None);
        reporter.downloaded(1, None);
    }

    #[tokio::test]
    async fn test_should_report_connection_failure() {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client builds");
        let transport = ReqwestTransport::with_client(client);
        let request = http::Request::builder()
            .method(http::Method::GET)
            .uri("http://127.0.0.1:1/")
            .body(Bytes::new())
            .expect("valid request");

        let err = transport
            .execute(request, ProgressReporter::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
