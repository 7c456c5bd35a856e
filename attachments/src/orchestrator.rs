use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use progress_tracking::{ItemProgressUpdate, ProgressEvent, ProgressReporter, ProgressUpdate, TrackingProgressUpdater};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::error_log::ErrorLog;
use crate::errors::{Result, TransportError, UploadFailure, map_join_error};
use crate::quota::{QuotaConfig, evaluate_batch};
use crate::registry::UploadRegistry;
use crate::selected_file::SelectedFile;
use crate::transport::{UploadTransport, UploadedFile};
use crate::upload_task::{AttachmentPreview, UploadId, UploadTask};

/// Name and url of every successfully uploaded file, in registry order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainedAttachments {
    pub names: Vec<String>,
    pub urls: Vec<String>,
}

impl DrainedAttachments {
    pub fn file_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(String::as_str).zip(self.urls.iter().map(String::as_str))
    }
}

/// A consistent copy of everything the composer renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposerSnapshot {
    pub attachments: Vec<AttachmentPreview>,
    pub pending_count: usize,
    pub errors: Vec<String>,
}

impl ComposerSnapshot {
    pub fn can_send(&self) -> bool {
        !self.attachments.is_empty() && self.pending_count == 0
    }
}

/// Registry, pending set and error log live under one lock so every transition updates all
/// three at once.
#[derive(Debug, Default)]
struct ComposerState {
    registry: UploadRegistry,

    /// Ids whose transport call has not settled.  An id leaves this set exactly once, which is
    /// what keeps the pending count from being decremented twice.
    pending: HashSet<UploadId>,

    error_log: ErrorLog,
}

impl ComposerState {
    fn snapshot(&self) -> ComposerSnapshot {
        ComposerSnapshot {
            attachments: self.registry.previews(),
            pending_count: self.pending.len(),
            errors: self.error_log.messages(),
        }
    }

    fn progress_update(&self, id: &UploadId) -> Option<ProgressUpdate> {
        let task = self.registry.get(id)?;
        let (total_bytes, total_bytes_completed) = self.registry.byte_totals();

        Some(ProgressUpdate {
            item_updates: vec![ItemProgressUpdate {
                tracking_id: id.as_ulid(),
                item_name: task.name().clone(),
                total_bytes: task.size(),
                bytes_completed: task.bytes_completed(),
                percentage: if task.is_succeeded() { 100 } else { task.loading_progress() },
            }],
            total_bytes,
            total_bytes_completed,
        })
    }
}

#[derive(Debug)]
struct OrchestratorShared {
    transport: Arc<dyn UploadTransport>,
    progress_updater: Option<Arc<dyn TrackingProgressUpdater>>,
    runtime: Handle,
    state: Mutex<ComposerState>,

    /// Bumped after every change to `state`.
    revision: watch::Sender<u64>,
}

/// Admits selected files, runs one upload per admitted file through the transport, and keeps
/// the attachment list, pending count and error log up to date as uploads progress and settle.
///
/// None of the operations block or fail because of an upload; problems end up in the error log.
/// Clones share the same state.
#[derive(Clone, Debug)]
pub struct UploadOrchestrator {
    inner: Arc<OrchestratorShared>,
}

impl UploadOrchestrator {
    /// Creates an orchestrator that spawns its uploads on the current tokio runtime.
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        progress_updater: Option<Arc<dyn TrackingProgressUpdater>>,
    ) -> Result<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(transport, progress_updater, runtime))
    }

    pub fn with_runtime(
        transport: Arc<dyn UploadTransport>,
        progress_updater: Option<Arc<dyn TrackingProgressUpdater>>,
        runtime: Handle,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(OrchestratorShared {
                transport,
                progress_updater,
                runtime,
                state: Mutex::new(ComposerState::default()),
                revision,
            }),
        }
    }

    /// Starts a new batch: clears the error log, applies the quota, and starts an upload for
    /// every admitted file.  Returns the ids of the admitted files in selection order.
    #[instrument(skip_all, name = "UploadOrchestrator::select_files", fields(num_files = files.len()))]
    pub fn select_files(&self, files: Vec<SelectedFile>, quota: &QuotaConfig) -> Vec<UploadId> {
        let n_selected = files.len();
        let mut started = Vec::new();

        {
            let mut state = self.inner.state.lock();
            state.error_log.clear();

            let decision = evaluate_batch(state.registry.len(), files, quota);
            for rejection in decision.rejections {
                warn!("{rejection}");
                state.error_log.push(rejection);
            }

            for file in decision.admitted {
                let id = UploadId::generate();
                let cancellation = CancellationToken::new();

                state
                    .registry
                    .insert(UploadTask::new(id, file.name.clone(), file.size, cancellation.clone()));
                state.pending.insert(id);
                started.push((id, file, cancellation));
            }

            self.inner.bump_revision();
        }

        info!("Admitted {} of {n_selected} selected files.", started.len());

        started
            .into_iter()
            .map(|(id, file, cancellation)| {
                let span = info_span!("upload", %id, file.name = %file.name, file.len = file.size);
                self.inner
                    .runtime
                    .spawn(self.inner.clone().drive_upload(id, file, cancellation).instrument(span));
                id
            })
            .collect()
    }

    /// Removes an attachment.  An upload still in flight is told to stop and no longer counts as
    /// pending; either way the transport is asked to delete the remote copy.
    ///
    /// Returns false, doing nothing, if the id isn't in the attachment list.
    pub fn cancel(&self, id: &UploadId) -> bool {
        {
            let mut state = self.inner.state.lock();
            let Some(mut task) = state.registry.remove(id) else {
                debug!("Cancel requested for unknown upload {id}; ignoring.");
                return false;
            };

            if state.pending.remove(id) {
                task.signal_cancel();
                info!("Cancelled in-flight upload {id} ({}).", task.name());
            } else {
                info!("Removed uploaded attachment {id} ({}).", task.name());
            }

            self.inner.bump_revision();
        }

        self.inner.request_remote_delete(*id);
        true
    }

    /// True when there is at least one attachment and no upload is still pending.
    pub fn can_send(&self) -> bool {
        let state = self.inner.state.lock();
        !state.registry.is_empty() && state.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Names and urls of the uploaded files, to be embedded in the outgoing message.  The
    /// attachment list is left as is; call [`clear`](Self::clear) once the message is sent.
    pub fn drain_for_send(&self) -> DrainedAttachments {
        let state = self.inner.state.lock();
        let mut drained = DrainedAttachments::default();
        for (name, url) in state.registry.succeeded() {
            drained.names.push(name.to_owned());
            drained.urls.push(url.to_owned());
        }
        drained
    }

    /// Empties the attachment list.  Uploads still in flight are cancelled and deleted remotely;
    /// the error log is kept.
    pub fn clear(&self) {
        let in_flight: Vec<UploadId> = {
            let mut state = self.inner.state.lock();
            let tasks = state.registry.take_all();

            let mut in_flight = Vec::new();
            for mut task in tasks {
                if state.pending.remove(task.id()) {
                    task.signal_cancel();
                    in_flight.push(*task.id());
                }
            }

            self.inner.bump_revision();
            in_flight
        };

        if !in_flight.is_empty() {
            info!("Cleared attachments; cancelling {} in-flight uploads.", in_flight.len());
        }

        for id in in_flight {
            self.inner.request_remote_delete(id);
        }
    }

    pub fn snapshot(&self) -> ComposerSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn attachments(&self) -> Vec<AttachmentPreview> {
        self.inner.state.lock().registry.previews()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.inner.state.lock().error_log.messages()
    }

    pub fn errors(&self) -> ErrorLog {
        self.inner.state.lock().error_log.clone()
    }

    /// A receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Resolves once no upload is pending.
    pub async fn wait_until_settled(&self) -> ComposerSnapshot {
        self.wait_for(|snapshot| snapshot.pending_count == 0).await
    }

    /// Resolves with the first snapshot satisfying `predicate`.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&ComposerSnapshot) -> bool) -> ComposerSnapshot {
        // Subscribe before looking so a change between the check and the wait isn't missed.
        let mut revisions = self.inner.revision.subscribe();
        loop {
            let snapshot = self.snapshot();
            if predicate(&snapshot) || revisions.changed().await.is_err() {
                return snapshot;
            }
        }
    }
}

impl OrchestratorShared {
    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Runs one upload to completion: forwards progress while the transport works, then
    /// settles the task with the transport's result.
    async fn drive_upload(self: Arc<Self>, id: UploadId, file: SelectedFile, cancellation: CancellationToken) {
        let (reporter, mut progress) = ProgressReporter::channel();

        {
            let mut state = self.state.lock();
            if state.registry.mark_uploading(&id) {
                self.bump_revision();
            }
        }

        let transport = self.transport.clone();
        // A separate task so a panicking transport fails only this upload.
        let mut upload = self
            .runtime
            .spawn(async move { transport.add_file(file, id, reporter, cancellation).await });

        let result = loop {
            tokio::select! {
                biased;
                Some(event) = progress.recv() => self.apply_progress(&id, event).await,
                joined = &mut upload => break joined.map_err(map_join_error).and_then(|r| r),
            }
        };

        while let Ok(event) = progress.try_recv() {
            self.apply_progress(&id, event).await;
        }

        self.settle(&id, result).await;
    }

    async fn apply_progress(&self, id: &UploadId, event: ProgressEvent) {
        let Some(percentage) = event.percentage() else {
            debug!("Ignoring progress event with unknown total ({} bytes loaded).", event.loaded);
            return;
        };

        let update = {
            let mut state = self.state.lock();
            if !state.registry.update_progress(id, percentage) {
                return;
            }
            debug!("Upload {id} at {percentage}%.");
            self.bump_revision();
            state.progress_update(id)
        };

        self.publish_progress(update).await;
    }

    async fn settle(&self, id: &UploadId, result: std::result::Result<UploadedFile, TransportError>) {
        let update = {
            let mut state = self.state.lock();

            // Cancelled or cleared while the transport was running.
            if !state.pending.remove(id) {
                debug!("Upload {id} settled after being removed; ignoring the result.");
                return;
            }

            let update = match result {
                Ok(UploadedFile { url }) => {
                    info!("Upload {id} succeeded: {url}");
                    state.registry.mark_succeeded(id, url);
                    state.progress_update(id)
                },
                Err(e) => {
                    if let Some(task) = state.registry.remove(id) {
                        warn!("Upload {id} ({}) failed: {e}", task.name());
                        state.error_log.push(UploadFailure::TransportFailure {
                            name: task.name().clone(),
                            detail: e.message(),
                        });
                    }
                    None
                },
            };

            self.bump_revision();
            update
        };

        self.publish_progress(update).await;
    }

    /// Updates are delivered one at a time and in order; each runs in its own task so a
    /// panicking updater cannot stop the upload from settling.
    async fn publish_progress(&self, update: Option<ProgressUpdate>) {
        let (Some(updater), Some(update)) = (self.progress_updater.clone(), update) else {
            return;
        };

        if let Err(e) = self.runtime.spawn(async move { updater.register_updates(update).await }).await {
            warn!("Progress updater failed: {e}");
        }
    }

    fn request_remote_delete(&self, id: UploadId) {
        let transport = self.transport.clone();
        self.runtime.spawn(async move {
            match transport.delete_file(id).await {
                Ok(outcome) => debug!("Remote delete of {id}: is_deleted = {}", outcome.is_deleted),
                Err(e) => warn!("Remote delete of {id} failed: {e}"),
            }
        });
    }
}
