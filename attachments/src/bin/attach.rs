use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use attachments::{AttachmentSummary, LocalTransport, MessageDraft, QuotaConfig, SelectedFile, UploadOrchestrator};
use clap::{Args, Parser};
use composer_config::ComposerConfig;
use composer_logging::{LoggingConfig, init_logging};
use progress_tracking::{ProgressUpdate, TrackingProgressUpdater};
use tracing::{debug, info};
use utils::{ByteSize, file_size_abbrev};

const DEFAULT_DEST: &str = "attachments";

/// Uploads files into a local attachment store and prints the resulting chat message.
#[derive(Parser)]
struct AttachCommand {
    #[clap(flatten)]
    overrides: CliOverrides,

    /// Directory the uploaded files are stored in.
    #[clap(long, default_value = DEFAULT_DEST)]
    dest: PathBuf,

    #[clap(long, default_value = "cli")]
    sender: String,

    #[clap(long, default_value = "default")]
    conversation: String,

    /// Message text; used as the description of the attached files.
    #[clap(long, short, default_value = "")]
    message: String,

    /// Only include the number of attached files in the message.
    #[clap(long)]
    count_only: bool,

    /// Files to attach.
    #[clap(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct CliOverrides {
    /// Maximum number of attached files.
    #[clap(long)]
    max_file_count: Option<usize>, // if not specified we use env:CHAT_COMPOSER_UPLOAD_MAX_FILE_COUNT
    /// Maximum size of a single file, e.g. "10mb".
    #[clap(long)]
    max_file_size: Option<ByteSize>, // if not specified we use env:CHAT_COMPOSER_UPLOAD_MAX_FILE_SIZE
}

/// Logs the overall progress of the batch as uploads advance.
#[derive(Debug)]
struct ProgressLogger;

#[async_trait::async_trait]
impl TrackingProgressUpdater for ProgressLogger {
    async fn register_updates(&self, updates: ProgressUpdate) {
        if updates.is_empty() {
            return;
        }
        for item in &updates.item_updates {
            debug!("{}: {}%", item.item_name, item.percentage);
        }
        info!(
            "Uploaded {}% of {}.",
            updates.completion_percentage(),
            file_size_abbrev(updates.total_bytes)
        );
    }
}

impl AttachCommand {
    fn config(&self) -> ComposerConfig {
        let mut config = ComposerConfig::from_env();
        if let Some(max_file_count) = self.overrides.max_file_count {
            config.upload.max_file_count = Some(max_file_count);
        }
        if let Some(max_file_size) = self.overrides.max_file_size {
            config.upload.max_file_size = Some(max_file_size);
        }
        config
    }

    async fn run(self, config: ComposerConfig) -> Result<()> {
        let transport = Arc::new(LocalTransport::from_config(&self.dest, &config.upload)?);
        let orchestrator = UploadOrchestrator::new(transport, Some(Arc::new(ProgressLogger)))?;

        let files = self
            .files
            .iter()
            .map(SelectedFile::from_path)
            .collect::<attachments::errors::Result<Vec<_>>>()?;

        orchestrator.select_files(files, &QuotaConfig::from(&config.upload));
        let snapshot = orchestrator.wait_until_settled().await;

        for error in &snapshot.errors {
            eprintln!("{error}");
        }

        if !snapshot.can_send() {
            bail!("No files could be attached.");
        }

        let summary = if self.count_only {
            AttachmentSummary::CountOnly
        } else {
            AttachmentSummary::Full
        };

        let draft = MessageDraft::new(self.sender, self.conversation).with_text(self.message);
        let Some(message) = draft.compose(&orchestrator.drain_for_send(), summary) else {
            bail!("Nothing to send.");
        };

        println!("{}", message.to_json()?);
        orchestrator.clear();
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = AttachCommand::parse();
    let config = cli.config();

    init_logging(LoggingConfig::new(concat!("attach/", env!("CARGO_PKG_VERSION")), &config.log));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(cli.run(config))
}
