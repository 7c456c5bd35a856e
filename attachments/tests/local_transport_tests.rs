use std::sync::Arc;
use std::time::Duration;

use attachments::{
    LocalTransport, QuotaConfig, SelectedFile, TransportError, UploadId, UploadOrchestrator, UploadTransport,
};
use composer_config::ComposerConfig;
use progress_tracking::ProgressReporter;
use serial_test::serial;
use tokio_util::sync::CancellationToken;
use url::Url;
use utils::EnvVarGuard;

const TIMEOUT: Duration = Duration::from_secs(10);

fn drain_percentages(receiver: &mut progress_tracking::ProgressReceiver) -> Vec<u8> {
    let mut percentages = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        percentages.extend(event.percentage());
    }
    percentages
}

#[tokio::test]
async fn test_stores_memory_content_in_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalTransport::new(dir.path().join("store"), 4).unwrap();
    let (reporter, mut receiver) = ProgressReporter::channel();
    let id = UploadId::generate();

    let uploaded = transport
        .add_file(SelectedFile::from_bytes("hello.txt", "hello world"), id, reporter, CancellationToken::new())
        .await
        .unwrap();

    let stored = transport.stored_path(&id);
    assert_eq!(std::fs::read(&stored).unwrap(), b"hello world");
    assert_eq!(Url::parse(&uploaded.url).unwrap().to_file_path().unwrap(), stored);

    // 0%, then one report per 4-byte block.
    assert_eq!(drain_percentages(&mut receiver), vec![0, 36, 73, 100]);
}

#[tokio::test]
async fn test_stores_disk_content() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.md");
    std::fs::write(&source, vec![7u8; 10_000]).unwrap();

    let transport = LocalTransport::new(dir.path().join("store"), 4096).unwrap();
    let id = UploadId::generate();
    transport
        .add_file(SelectedFile::from_path(&source).unwrap(), id, ProgressReporter::detached(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(transport.stored_path(&id)).unwrap().len(), 10_000);
}

#[tokio::test]
async fn test_cancelled_upload_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalTransport::new(dir.path(), 1).unwrap();
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let id = UploadId::generate();
    let result = transport
        .add_file(SelectedFile::from_bytes("a.bin", vec![1u8; 64]), id, ProgressReporter::detached(), cancellation)
        .await;

    assert!(matches!(result, Err(TransportError::Cancelled)));
    assert_eq!(std::fs::read_dir(transport.root()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_then_delete_races_completion_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(LocalTransport::new(dir.path(), 1024).unwrap());

    for i in 0..200 {
        let id = UploadId::generate();
        let cancellation = CancellationToken::new();

        let upload = tokio::spawn({
            let transport = transport.clone();
            let cancellation = cancellation.clone();
            async move {
                transport
                    .add_file(SelectedFile::from_bytes("race.bin", vec![9u8; 4096]), id, ProgressReporter::detached(), cancellation)
                    .await
            }
        });

        for _ in 0..(i % 16) {
            tokio::task::yield_now().await;
        }

        // Same order as cancelling through the composer: token first, then the remote delete.
        cancellation.cancel();
        transport.delete_file(id).await.unwrap();
        let _ = tokio::time::timeout(TIMEOUT, upload).await.unwrap().unwrap();

        assert!(!transport.stored_path(&id).exists(), "iteration {i} left {id} in the store");
        assert_eq!(std::fs::read_dir(transport.root()).unwrap().count(), 0, "iteration {i}");
    }
}

#[tokio::test]
async fn test_metadata_only_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalTransport::new(dir.path(), 16).unwrap();

    let result = transport
        .add_file(
            SelectedFile::with_size("ghost.txt", 12),
            UploadId::generate(),
            ProgressReporter::detached(),
            CancellationToken::new(),
        )
        .await;

    let Err(e) = result else { panic!("expected a rejection") };
    assert!(e.message().unwrap().contains("ghost.txt"));
}

#[tokio::test]
async fn test_delete_file() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalTransport::new(dir.path(), 16).unwrap();
    let id = UploadId::generate();
    transport
        .add_file(SelectedFile::from_bytes("x", "x"), id, ProgressReporter::detached(), CancellationToken::new())
        .await
        .unwrap();

    assert!(transport.delete_file(id).await.unwrap().is_deleted);
    assert!(!transport.stored_path(&id).exists());
    assert!(!transport.delete_file(id).await.unwrap().is_deleted);
}

#[test]
fn test_rejects_zero_block_size() {
    let dir = tempfile::tempdir().unwrap();
    assert!(LocalTransport::new(dir.path(), 0).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_orchestrated_upload_with_env_config() {
    let _count = EnvVarGuard::set("CHAT_COMPOSER_UPLOAD_MAX_FILE_COUNT", "2");
    let _size = EnvVarGuard::set("CHAT_COMPOSER_UPLOAD_MAX_FILE_SIZE", "1kb");
    let _block = EnvVarGuard::set("CHAT_COMPOSER_UPLOAD_LOCAL_BLOCK_SIZE", "256");
    let config = ComposerConfig::from_env();

    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(LocalTransport::from_config(dir.path(), &config.upload).unwrap());
    let orchestrator = UploadOrchestrator::new(transport.clone(), None).unwrap();

    let files = vec![
        SelectedFile::from_bytes("small.txt", vec![b'a'; 1000]),
        SelectedFile::from_bytes("large.txt", vec![b'b'; 2000]),
        SelectedFile::from_bytes("extra.txt", vec![b'c'; 10]),
    ];
    let ids = orchestrator.select_files(files, &QuotaConfig::from(&config.upload));
    assert_eq!(ids.len(), 1);

    let snapshot = tokio::time::timeout(TIMEOUT, orchestrator.wait_until_settled()).await.unwrap();
    assert!(snapshot.can_send());
    assert_eq!(
        snapshot.errors,
        [
            "You can only upload up to 2 files.",
            "Failed to upload large.txt. You cannot upload files larger than 1 KB."
        ]
    );

    let drained = orchestrator.drain_for_send();
    assert_eq!(drained.names, ["small.txt"]);
    assert_eq!(std::fs::read(transport.stored_path(&ids[0])).unwrap().len(), 1000);
}
