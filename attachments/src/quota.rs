use composer_config::groups::upload::ConfigValueGroup as UploadConfigGroup;

use crate::errors::UploadFailure;
use crate::selected_file::SelectedFile;

/// Limits applied when files are selected.  `None` means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuotaConfig {
    /// Cap on attached plus in-flight files.
    pub max_file_count: Option<usize>,

    /// Cap on the size of one file, in bytes.
    pub max_file_size: Option<u64>,

    /// Passed through to the file picker; not enforced here.
    pub accepted_file_types: Option<String>,
}

impl QuotaConfig {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_file_count(mut self, max_file_count: usize) -> Self {
        self.max_file_count = Some(max_file_count);
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = Some(max_file_size);
        self
    }
}

impl From<&UploadConfigGroup> for QuotaConfig {
    fn from(config: &UploadConfigGroup) -> Self {
        Self {
            max_file_count: config.max_file_count,
            max_file_size: config.max_file_size.map(|s| s.as_u64()),
            accepted_file_types: config.accepted_file_types.clone(),
        }
    }
}

/// The outcome of running a selected batch through the quota.
#[derive(Debug, Default)]
pub struct AdmissionDecision {
    /// Files to upload, in selection order.
    pub admitted: Vec<SelectedFile>,

    /// One entry for a count overflow (if any), followed by one per oversized file.
    pub rejections: Vec<UploadFailure>,
}

/// How many of `n_selected` new files fit next to `current_count` existing ones.
pub fn admissible_count(current_count: usize, n_selected: usize, max_file_count: Option<usize>) -> usize {
    match max_file_count {
        Some(max) => n_selected.min(max.saturating_sub(current_count)),
        None => n_selected,
    }
}

/// Applies the count cap, then the size cap, to a batch of selected files.
///
/// Files beyond the count cap are dropped without a per-file message.  Oversized files within
/// the admitted prefix are rejected individually and never admitted.
pub fn evaluate_batch(current_count: usize, files: Vec<SelectedFile>, quota: &QuotaConfig) -> AdmissionDecision {
    let mut decision = AdmissionDecision::default();

    let n_admissible = admissible_count(current_count, files.len(), quota.max_file_count);
    if n_admissible < files.len() {
        if let Some(max_file_count) = quota.max_file_count {
            decision.rejections.push(UploadFailure::AdmissionRejection { max_file_count });
        }
    }

    for file in files.into_iter().take(n_admissible) {
        match quota.max_file_size {
            Some(max_file_size) if file.size > max_file_size => {
                decision.rejections.push(UploadFailure::SizeRejection {
                    name: file.name.clone(),
                    max_file_size,
                });
            },
            _ => decision.admitted.push(file),
        }
    }

    decision
}
