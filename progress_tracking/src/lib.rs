mod no_op_tracker;
mod progress_event;
mod progress_info;
pub mod verification_wrapper;

pub use no_op_tracker::NoOpProgressUpdater;
pub use progress_event::{ProgressEvent, ProgressReceiver, ProgressReporter};
pub use progress_info::{ItemProgressUpdate, ProgressUpdate};
pub use verification_wrapper::ProgressUpdaterVerificationWrapper;

/// The trait that a progress updater that reports per-item progress completion.
#[async_trait::async_trait]
pub trait TrackingProgressUpdater: std::fmt::Debug + Send + Sync {
    /// Register a batch of updates, each carrying per-item progress and the totals across
    /// all items currently tracked.  A panic here is logged by the caller and the update dropped.
    async fn register_updates(&self, updates: ProgressUpdate);
}
