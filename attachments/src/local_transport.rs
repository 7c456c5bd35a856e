use std::path::{Path, PathBuf};

use async_trait::async_trait;
use composer_config::groups::upload::ConfigValueGroup as UploadConfigGroup;
use progress_tracking::ProgressReporter;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::errors::{AttachmentError, Result, TransportError};
use crate::selected_file::{FileContent, SelectedFile};
use crate::transport::{DeleteOutcome, UploadTransport, UploadedFile};
use crate::upload_task::UploadId;

const PARTIAL_EXTENSION: &str = "partial";

/// Stores attachments as files named by upload id in a local directory.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
    block_size: usize,
}

impl LocalTransport {
    /// Creates the storage directory if needed.  `block_size` is how much is copied between
    /// progress reports and cancellation checks.
    pub fn new(root: impl AsRef<Path>, block_size: u64) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        // Urls need an absolute path.
        let root = root.canonicalize()?;

        let block_size = usize::try_from(block_size)
            .ok()
            .filter(|&b| b > 0)
            .ok_or_else(|| AttachmentError::InvalidFile(format!("invalid block size {block_size}")))?;

        Ok(Self { root, block_size })
    }

    pub fn from_config(root: impl AsRef<Path>, config: &UploadConfigGroup) -> Result<Self> {
        Self::new(root, config.local_block_size.as_u64())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the upload with the given id ends up once complete.
    pub fn stored_path(&self, id: &UploadId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn partial_path(&self, id: &UploadId) -> PathBuf {
        self.stored_path(id).with_extension(PARTIAL_EXTENSION)
    }

    async fn open_source(file: SelectedFile) -> std::result::Result<(Box<dyn AsyncRead + Unpin + Send>, u64), TransportError> {
        match file.content {
            FileContent::Memory(data) => {
                let len = data.len() as u64;
                Ok((Box::new(std::io::Cursor::new(data)), len))
            },
            FileContent::Disk(path) => {
                let f = File::open(&path).await?;
                let len = f.metadata().await?.len();
                Ok((Box::new(f), len))
            },
            FileContent::Unavailable => Err(TransportError::Rejected(format!("The content of {} is not available.", file.name))),
        }
    }

    async fn copy_in_blocks(
        &self,
        file: SelectedFile,
        dest: &Path,
        progress: &ProgressReporter,
        cancellation: &CancellationToken,
    ) -> std::result::Result<(), TransportError> {
        let (mut reader, total) = Self::open_source(file).await?;
        let mut writer = File::create(dest).await?;
        let mut buffer = vec![0u8; self.block_size];
        let mut loaded = 0u64;

        progress.report(0, total);

        loop {
            if cancellation.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }

            writer.write_all(&buffer[..n]).await?;
            loaded += n as u64;
            progress.report(loaded, total);

            tokio::task::yield_now().await;
        }

        writer.flush().await?;
        writer.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl UploadTransport for LocalTransport {
    async fn add_file(
        &self,
        file: SelectedFile,
        id: UploadId,
        progress: ProgressReporter,
        cancellation: CancellationToken,
    ) -> std::result::Result<UploadedFile, TransportError> {
        let partial = self.partial_path(&id);
        let name = file.name.clone();

        let copied = match self.copy_in_blocks(file, &partial, &progress, &cancellation).await {
            Ok(()) if cancellation.is_cancelled() => Err(TransportError::Cancelled),
            result => result,
        };

        if let Err(e) = copied {
            // Nothing to clean up if the partial file was never created.
            let _ = tokio::fs::remove_file(&partial).await;
            debug!("Local upload of {name} as {id} stopped: {e}");
            return Err(e);
        }

        let stored = self.stored_path(&id);
        tokio::fs::rename(&partial, &stored).await?;

        // A delete issued while renaming may have found nothing to remove; the cancellation fired
        // before that delete, so checking it here catches the file it missed.
        if cancellation.is_cancelled() {
            let _ = tokio::fs::remove_file(&stored).await;
            debug!("Local upload of {name} as {id} cancelled after completing; removed {stored:?}.");
            return Err(TransportError::Cancelled);
        }

        let url = Url::from_file_path(&stored)
            .map_err(|_| TransportError::Rejected(format!("Cannot build a url for {stored:?}.")))?;

        info!("Stored {name} as {stored:?}.");
        Ok(UploadedFile { url: url.into() })
    }

    async fn delete_file(&self, id: UploadId) -> std::result::Result<DeleteOutcome, TransportError> {
        match tokio::fs::remove_file(self.stored_path(&id)).await {
            Ok(()) => Ok(DeleteOutcome { is_deleted: true }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome { is_deleted: false }),
            Err(e) => Err(e.into()),
        }
    }
}
