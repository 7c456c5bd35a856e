use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use progress_tracking::ProgressReporter;
use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;

use crate::errors::TransportError;
use crate::selected_file::SelectedFile;
use crate::transport::{DeleteOutcome, UploadTransport, UploadedFile};
use crate::upload_task::UploadId;

type UploadResult = Result<UploadedFile, TransportError>;

/// Handle to one upload started on a [`ManualTransport`].  The upload stays in flight until the
/// test settles it through this handle or the orchestrator cancels it.
#[derive(Clone, Debug)]
pub struct PendingUpload {
    id: UploadId,
    name: Arc<str>,
    progress: ProgressReporter,
    cancellation: CancellationToken,
    result: Arc<Mutex<Option<oneshot::Sender<UploadResult>>>>,
}

impl PendingUpload {
    pub fn id(&self) -> UploadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn report_progress(&self, loaded: u64, total: u64) -> bool {
        self.progress.report(loaded, total)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns false if the upload was already settled.
    pub fn settle(&self, result: UploadResult) -> bool {
        match self.result.lock().take() {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }

    pub fn succeed(&self, url: impl Into<String>) -> bool {
        self.settle(Ok(UploadedFile { url: url.into() }))
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.settle(Err(TransportError::Rejected(message.into())))
    }

    pub fn fail_without_message(&self) -> bool {
        self.settle(Err(TransportError::Unspecified))
    }
}

#[derive(Debug, Default)]
struct ManualTransportState {
    uploads: Vec<PendingUpload>,
    deleted: Vec<UploadId>,
    fail_deletes: bool,
}

/// A transport driven by the test: every upload blocks until settled through its
/// [`PendingUpload`] handle, and resolves as cancelled as soon as its cancellation token fires.
/// Delete requests are recorded.
#[derive(Debug, Default)]
pub struct ManualTransport {
    state: Mutex<ManualTransportState>,
    upload_started: Notify,
    delete_requested: Notify,
}

impl ManualTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later delete request fail.
    pub fn set_fail_deletes(&self, fail_deletes: bool) {
        self.state.lock().fail_deletes = fail_deletes;
    }

    pub fn started_uploads(&self) -> Vec<PendingUpload> {
        self.state.lock().uploads.clone()
    }

    pub fn upload_named(&self, name: &str) -> Option<PendingUpload> {
        self.state.lock().uploads.iter().find(|u| u.name() == name).cloned()
    }

    pub fn deleted(&self) -> Vec<UploadId> {
        self.state.lock().deleted.clone()
    }

    /// Waits until at least `n` uploads have reached the transport; returns them in the order
    /// they arrived.
    pub async fn wait_for_uploads(&self, n: usize) -> Vec<PendingUpload> {
        loop {
            let started = self.upload_started.notified();
            {
                let state = self.state.lock();
                if state.uploads.len() >= n {
                    return state.uploads.clone();
                }
            }
            started.await;
        }
    }

    pub async fn wait_for_upload(&self, name: &str) -> PendingUpload {
        loop {
            let started = self.upload_started.notified();
            if let Some(upload) = self.upload_named(name) {
                return upload;
            }
            started.await;
        }
    }

    /// Waits until at least `n` delete requests were made.
    pub async fn wait_for_deletes(&self, n: usize) -> Vec<UploadId> {
        loop {
            let requested = self.delete_requested.notified();
            {
                let state = self.state.lock();
                if state.deleted.len() >= n {
                    return state.deleted.clone();
                }
            }
            requested.await;
        }
    }
}

#[async_trait]
impl UploadTransport for ManualTransport {
    async fn add_file(
        &self,
        file: SelectedFile,
        id: UploadId,
        progress: ProgressReporter,
        cancellation: CancellationToken,
    ) -> UploadResult {
        let (sender, receiver) = oneshot::channel();
        self.state.lock().uploads.push(PendingUpload {
            id,
            name: file.name.clone(),
            progress,
            cancellation: cancellation.clone(),
            result: Arc::new(Mutex::new(Some(sender))),
        });
        self.upload_started.notify_waiters();

        tokio::select! {
            result = receiver => result.unwrap_or(Err(TransportError::Unspecified)),
            _ = cancellation.cancelled() => Err(TransportError::Cancelled),
        }
    }

    async fn delete_file(&self, id: UploadId) -> Result<DeleteOutcome, TransportError> {
        let fail = {
            let mut state = self.state.lock();
            state.deleted.push(id);
            state.fail_deletes
        };
        self.delete_requested.notify_waiters();

        if fail {
            Err(TransportError::Rejected("delete failed".to_owned()))
        } else {
            Ok(DeleteOutcome { is_deleted: true })
        }
    }
}
