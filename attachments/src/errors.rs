use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;
use utils::file_size_abbrev;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("No async runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AttachmentError>;

/// Errors produced by an upload transport.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Upload cancelled.")]
    Cancelled,

    #[error("{0}")]
    Rejected(String),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Upload task failed: {0}")]
    TaskFailed(String),

    /// A failure without any detail worth showing to the user.
    #[error("Upload failed.")]
    Unspecified,
}

impl TransportError {
    /// The user-facing message for this failure, if there is one.
    pub fn message(&self) -> Option<String> {
        match self {
            TransportError::Unspecified => None,
            TransportError::Rejected(msg) if msg.trim().is_empty() => None,
            e => Some(e.to_string()),
        }
    }
}

pub(crate) fn map_join_error(e: JoinError) -> TransportError {
    if e.is_panic() {
        error!("Panic reported on upload task: {e:?}");
        TransportError::TaskFailed("the upload panicked".to_owned())
    } else {
        TransportError::TaskFailed(e.to_string())
    }
}

/// A failure recorded in the error log.  The display text is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The batch would have exceeded the file count limit; files past the limit were dropped.
    #[error("You can only upload up to {max_file_count} files.")]
    AdmissionRejection { max_file_count: usize },

    /// A single file exceeded the size limit and was never uploaded.
    #[error("Failed to upload {name}. You cannot upload files larger than {}.", size_limit(.max_file_size))]
    SizeRejection { name: Arc<str>, max_file_size: u64 },

    /// The transport rejected an admitted upload.
    #[error("Failed to upload {name}.{}", detail_suffix(.detail))]
    TransportFailure { name: Arc<str>, detail: Option<String> },
}

fn size_limit(max_file_size: &u64) -> String {
    file_size_abbrev(*max_file_size)
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" {d}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            UploadFailure::AdmissionRejection { max_file_count: 3 }.to_string(),
            "You can only upload up to 3 files."
        );
        assert_eq!(
            UploadFailure::SizeRejection {
                name: "big.bin".into(),
                max_file_size: 1_048_576
            }
            .to_string(),
            "Failed to upload big.bin. You cannot upload files larger than 1 MB."
        );
        assert_eq!(
            UploadFailure::TransportFailure {
                name: "a.txt".into(),
                detail: Some("Server unavailable".to_owned())
            }
            .to_string(),
            "Failed to upload a.txt. Server unavailable"
        );
        assert_eq!(
            UploadFailure::TransportFailure {
                name: "a.txt".into(),
                detail: None
            }
            .to_string(),
            "Failed to upload a.txt."
        );
    }

    #[test]
    fn test_transport_error_message() {
        assert_eq!(TransportError::Unspecified.message(), None);
        assert_eq!(TransportError::Rejected("  ".to_owned()).message(), None);
        assert_eq!(TransportError::Rejected("quota exceeded".to_owned()).message().as_deref(), Some("quota exceeded"));
        assert_eq!(TransportError::Cancelled.message().as_deref(), Some("Upload cancelled."));
    }
}
