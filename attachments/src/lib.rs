#![cfg_attr(feature = "strict", deny(warnings))]

mod error_log;
pub mod errors;
mod local_transport;
pub mod message;
mod orchestrator;
pub mod quota;
mod registry;
mod selected_file;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
mod transport;
mod upload_task;

pub use error_log::ErrorLog;
pub use errors::{AttachmentError, TransportError, UploadFailure};
pub use local_transport::LocalTransport;
pub use message::{AttachmentSummary, MessageDraft, OutgoingMessage};
pub use orchestrator::{ComposerSnapshot, DrainedAttachments, UploadOrchestrator};
pub use quota::{AdmissionDecision, QuotaConfig, evaluate_batch};
pub use registry::UploadRegistry;
pub use selected_file::{FileContent, SelectedFile};
pub use transport::{DeleteOutcome, UploadTransport, UploadedFile};
pub use upload_task::{AttachmentPreview, UploadId, UploadStatus, UploadTask};
