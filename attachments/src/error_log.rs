use crate::errors::UploadFailure;

/// Failures observed since the current batch of files was selected, in the order they were observed.
///
/// Entries are only ever appended; the log is cleared wholesale when a new batch starts.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    entries: Vec<UploadFailure>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, failure: UploadFailure) {
        self.entries.push(failure);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[UploadFailure] {
        &self.entries
    }

    /// The user-facing messages, ready for display.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
