use crate::upload_task::{AttachmentPreview, UploadId, UploadTask};

/// The ordered collection of upload tasks in the current composer session.
///
/// Tasks are kept in selection order; updates happen in place so progress or completion never
/// changes a task's position.  Ids are unique among the tasks present.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    tasks: Vec<UploadTask>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadTask> {
        self.tasks.iter()
    }

    pub fn contains(&self, id: &UploadId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &UploadId) -> Option<&UploadTask> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    fn position(&self, id: &UploadId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    fn get_mut(&mut self, id: &UploadId) -> Option<&mut UploadTask> {
        self.tasks.iter_mut().find(|t| t.id() == id)
    }

    /// Appends a task.  Returns false, leaving the registry untouched, if the id is already present.
    pub(crate) fn insert(&mut self, task: UploadTask) -> bool {
        if self.contains(task.id()) {
            debug_assert!(false, "Duplicate upload id {}", task.id());
            return false;
        }
        self.tasks.push(task);
        true
    }

    /// Removes a task, keeping the relative order of the others.
    pub(crate) fn remove(&mut self, id: &UploadId) -> Option<UploadTask> {
        self.position(id).map(|i| self.tasks.remove(i))
    }

    pub(crate) fn take_all(&mut self) -> Vec<UploadTask> {
        std::mem::take(&mut self.tasks)
    }

    pub(crate) fn mark_uploading(&mut self, id: &UploadId) -> bool {
        self.get_mut(id).map(|t| t.mark_uploading()).is_some()
    }

    /// Overwrites the progress of a task; returns false if the task is gone.
    pub(crate) fn update_progress(&mut self, id: &UploadId, percentage: u8) -> bool {
        self.get_mut(id).map(|t| t.set_loading_progress(percentage)).is_some()
    }

    pub(crate) fn mark_succeeded(&mut self, id: &UploadId, url: String) -> bool {
        self.get_mut(id).map(|t| t.mark_succeeded(url)).is_some()
    }

    pub fn previews(&self) -> Vec<AttachmentPreview> {
        self.tasks.iter().map(UploadTask::preview).collect()
    }

    /// Name and url of every succeeded task, in registry order.
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tasks.iter().filter_map(|t| t.url().map(|url| (&**t.name(), url)))
    }

    /// (total bytes, completed bytes) across all tasks.
    pub fn byte_totals(&self) -> (u64, u64) {
        self.tasks
            .iter()
            .fold((0, 0), |(total, done), t| (total + t.size(), done + t.bytes_completed()))
    }
}
