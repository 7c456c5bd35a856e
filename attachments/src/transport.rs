use std::fmt::Debug;

use async_trait::async_trait;
use progress_tracking::ProgressReporter;
use tokio_util::sync::CancellationToken;

use crate::errors::TransportError;
use crate::selected_file::SelectedFile;
use crate::upload_task::UploadId;

/// The result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
}

/// The result of a remote delete request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub is_deleted: bool,
}

/// Moves files to wherever attachments are stored and removes them again.
///
/// `add_file` is called once per admitted file.  It may report progress any number of times
/// before returning and should stop its work soon after `cancellation` fires; whatever it
/// returns for a cancelled upload is ignored.
#[async_trait]
pub trait UploadTransport: Debug + Send + Sync {
    async fn add_file(
        &self,
        file: SelectedFile,
        id: UploadId,
        progress: ProgressReporter,
        cancellation: CancellationToken,
    ) -> Result<UploadedFile, TransportError>;

    /// Best effort; failures are only logged by the caller.
    async fn delete_file(&self, id: UploadId) -> Result<DeleteOutcome, TransportError>;
}
