use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use ulid::Ulid;

/// Identity of one upload, generated when the file is admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadId(Ulid);

impl UploadId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UploadId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Where an upload is in its lifecycle.  Failed and cancelled uploads are dropped from the
/// registry, so they have no status here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    /// Registered, transport not yet invoked.
    Admitted,
    Uploading,
    Succeeded { url: String },
}

/// One file's unit of upload work.
#[derive(Debug)]
pub struct UploadTask {
    id: UploadId,
    name: Arc<str>,
    size: u64,
    loading_progress: u8,
    status: UploadStatus,

    /// Released once the upload settles or is cancelled; taking it is what guarantees the
    /// cancellation signal fires at most once.
    cancellation: Option<CancellationToken>,
}

/// A read-only view of an upload task for rendering previews.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentPreview {
    pub id: UploadId,
    pub name: Arc<str>,
    pub size: u64,
    pub loading_progress: u8,
    pub url: Option<String>,
}

impl UploadTask {
    pub(crate) fn new(id: UploadId, name: Arc<str>, size: u64, cancellation: CancellationToken) -> Self {
        Self {
            id,
            name,
            size,
            loading_progress: 0,
            status: UploadStatus::Admitted,
            cancellation: Some(cancellation),
        }
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn loading_progress(&self) -> u8 {
        self.loading_progress
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    pub fn url(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Succeeded { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, UploadStatus::Succeeded { .. })
    }

    /// Bytes counted as done: everything once succeeded, otherwise the reported share.
    pub fn bytes_completed(&self) -> u64 {
        if self.is_succeeded() {
            self.size
        } else {
            (self.size as u128 * self.loading_progress as u128 / 100) as u64
        }
    }

    pub fn preview(&self) -> AttachmentPreview {
        AttachmentPreview {
            id: self.id,
            name: self.name.clone(),
            size: self.size,
            loading_progress: self.loading_progress,
            url: self.url().map(str::to_owned),
        }
    }

    pub(crate) fn mark_uploading(&mut self) {
        if self.status == UploadStatus::Admitted {
            self.status = UploadStatus::Uploading;
        }
    }

    pub(crate) fn set_loading_progress(&mut self, percentage: u8) {
        debug_assert!(percentage <= 100);
        self.loading_progress = percentage.min(100);
    }

    pub(crate) fn mark_succeeded(&mut self, url: String) {
        self.status = UploadStatus::Succeeded { url };
        self.cancellation = None;
    }

    /// Signal the transport to abort.  Returns false if the signal was already sent or the
    /// handle was released.
    pub(crate) fn signal_cancel(&mut self) -> bool {
        match self.cancellation.take() {
            Some(token) => {
                token.cancel();
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(size: u64) -> (UploadTask, CancellationToken) {
        let token = CancellationToken::new();
        (UploadTask::new(UploadId::generate(), "photo.png".into(), size, token.clone()), token)
    }

    #[test]
    fn test_upload_id_round_trip_through_string() {
        let id = UploadId::generate();
        assert_eq!(id.to_string().len(), 26);
        assert_eq!(id.to_string().parse::<UploadId>().unwrap(), id);
        assert!("not-an-id".parse::<UploadId>().is_err());
    }

    #[test]
    fn test_lifecycle() {
        let (mut task, token) = task(1000);
        assert_eq!(task.status(), &UploadStatus::Admitted);
        assert_eq!(task.loading_progress(), 0);

        task.mark_uploading();
        task.set_loading_progress(40);
        assert_eq!(task.status(), &UploadStatus::Uploading);
        assert_eq!(task.bytes_completed(), 400);
        assert_eq!(task.url(), None);

        task.mark_succeeded("https://files/1".to_owned());
        assert_eq!(task.url(), Some("https://files/1"));
        assert_eq!(task.bytes_completed(), 1000);

        // The handle is released on success, so no signal reaches the transport.
        assert!(!task.signal_cancel());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancellation_signaled_at_most_once() {
        let (mut task, token) = task(10);
        assert!(task.signal_cancel());
        assert!(token.is_cancelled());
        assert!(!task.signal_cancel());
    }

    #[test]
    fn test_latest_progress_report_wins() {
        let (mut task, _token) = task(10);
        task.set_loading_progress(80);
        task.set_loading_progress(30);
        assert_eq!(task.loading_progress(), 30);
    }
}
