use tokio::sync::mpsc;

/// A raw progress notification from a transfer: `loaded` of `total` bytes sent so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: u64,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// `round(loaded / total * 100)`, clamped to 100.  `None` when the total is unknown (zero).
    pub fn percentage(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let percent = (self.loaded as f64 / self.total as f64) * 100.0;
        Some(percent.round().min(100.0) as u8)
    }
}

pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Handle given to a transfer so it can report progress.  Reports never block; they are queued
/// and applied by whoever holds the receiving end, in the order they were sent.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressReporter {
    pub fn channel() -> (ProgressReporter, ProgressReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ProgressReporter { sender }, receiver)
    }

    /// A reporter whose reports go nowhere.
    pub fn detached() -> ProgressReporter {
        Self::channel().0
    }

    /// Queue a progress report.  Returns false if nobody is listening anymore, e.g. because the
    /// transfer was abandoned.
    pub fn report(&self, loaded: u64, total: u64) -> bool {
        self.sender.send(ProgressEvent::new(loaded, total)).is_ok()
    }
}
