//! Correlation of in-flight requests to their pending responses.
//!
//! Every issued request gets a fresh [`RequestHandle`]; completions carry the
//! handle back and the dispatcher removes the entry to process it. A listing
//! that continues is re-inserted under a new handle for the next page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use s3lite_model::S3Response;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::config::ClientConfig;
use crate::request::S3Request;

/// Opaque handle of one issued HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RequestHandle(pub(crate) u64);

/// Everything the dispatcher needs to finish or continue an operation.
#[derive(Debug)]
pub(crate) struct PendingOperation {
    /// Configuration snapshot taken when the operation was issued.
    pub config: ClientConfig,
    pub request: S3Request,
    pub response: S3Response,
    pub notifier: oneshot::Sender<S3Response>,
    task: Option<AbortHandle>,
}

impl PendingOperation {
    pub fn new(
        config: ClientConfig,
        request: S3Request,
        response: S3Response,
        notifier: oneshot::Sender<S3Response>,
    ) -> Self {
        Self {
            config,
            request,
            response,
            notifier,
            task: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    next: AtomicU64,
    entries: Mutex<HashMap<RequestHandle, PendingOperation>>,
}

impl Registry {
    pub fn insert(&self, mut pending: PendingOperation) -> RequestHandle {
        let handle = RequestHandle(self.next.fetch_add(1, Ordering::Relaxed));
        pending.task = None;
        self.entries.lock().insert(handle, pending);
        handle
    }

    /// Record the transport task so it can be aborted. A no-op if the
    /// request already completed.
    pub fn attach_task(&self, handle: RequestHandle, task: AbortHandle) {
        if let Some(pending) = self.entries.lock().get_mut(&handle) {
            pending.task = Some(task);
        }
    }

    pub fn take(&self, handle: RequestHandle) -> Option<PendingOperation> {
        self.entries.lock().remove(&handle)
    }

    /// Abort every in-flight task and discard its pending operation.
    /// Dropping the notifiers resolves the handles as cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingOperation> = self.entries.lock().drain().map(|(_, p)| p).collect();
        for pending in &drained {
            if let Some(task) = &pending.task {
                task.abort();
            }
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
