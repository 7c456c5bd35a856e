use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::errors::{AttachmentError, Result};

/// Where the bytes of a selected file come from.
#[derive(Clone, Debug)]
pub enum FileContent {
    Memory(Bytes),
    Disk(PathBuf),
    /// Only the metadata is known; the transport is expected to source the bytes itself.
    Unavailable,
}

/// A file picked by the user for attaching to a message.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    pub name: Arc<str>,
    pub size: u64,
    pub content: FileContent,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<Arc<str>>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            content: FileContent::Memory(data),
        }
    }

    /// A file known only by name and size.
    pub fn with_size(name: impl Into<Arc<str>>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content: FileContent::Unavailable,
        }
    }

    /// Reads the name and size of a file on disk; the content is read by the transport later.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(AttachmentError::InvalidFile(format!("{path:?} is not a regular file")));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AttachmentError::InvalidFile(format!("{path:?} has no file name")))?;

        Ok(Self {
            name: name.into(),
            size: metadata.len(),
            content: FileContent::Disk(path.to_path_buf()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_uses_data_length() {
        let file = SelectedFile::from_bytes("notes.txt", vec![0u8; 1024]);
        assert_eq!(&*file.name, "notes.txt");
        assert_eq!(file.size, 1024);
        assert!(matches!(file.content, FileContent::Memory(ref b) if b.len() == 1024));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(&*file.name, "report.pdf");
        assert_eq!(file.size, 8);
        assert!(matches!(file.content, FileContent::Disk(ref p) if p == &path));

        assert!(matches!(SelectedFile::from_path(dir.path()), Err(AttachmentError::InvalidFile(_))));
        assert!(matches!(SelectedFile::from_path(dir.path().join("missing")), Err(AttachmentError::IOError(_))));
    }
}
