use std::collections::HashMap;
use std::sync::Arc;

use more_asserts::assert_le;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::{ItemProgressUpdate, ProgressUpdate, TrackingProgressUpdater};

#[derive(Debug, Default)]
struct VerificationState {
    n_updates: usize,
    items: HashMap<Ulid, ItemProgressUpdate>,
    last_totals: (u64, u64),
}

/// Wraps a progress updater and checks every update passing through it for consistency before
/// forwarding it.  Intended for tests.
#[derive(Debug)]
pub struct ProgressUpdaterVerificationWrapper {
    inner: Arc<dyn TrackingProgressUpdater>,
    state: Mutex<VerificationState>,
}

impl ProgressUpdaterVerificationWrapper {
    pub fn new(inner: Arc<dyn TrackingProgressUpdater>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            state: Mutex::new(VerificationState::default()),
        })
    }

    pub async fn n_updates(&self) -> usize {
        self.state.lock().await.n_updates
    }

    /// The latest update seen for the item with the given tracking id.
    pub async fn last_item_update(&self, tracking_id: Ulid) -> Option<ItemProgressUpdate> {
        self.state.lock().await.items.get(&tracking_id).cloned()
    }

    /// Asserts that the most recent update reported everything tracked as complete.
    pub async fn assert_complete(&self) {
        let state = self.state.lock().await;
        let (total, completed) = state.last_totals;
        assert_eq!(total, completed, "Last update reported {completed} of {total} bytes completed.");
    }
}

#[async_trait::async_trait]
impl TrackingProgressUpdater for ProgressUpdaterVerificationWrapper {
    async fn register_updates(&self, updates: ProgressUpdate) {
        {
            let mut state = self.state.lock().await;
            state.n_updates += 1;

            assert_le!(updates.total_bytes_completed, updates.total_bytes);

            for item in &updates.item_updates {
                assert_le!(item.percentage, 100);
                assert_le!(item.bytes_completed, item.total_bytes);
                if item.percentage == 100 {
                    assert_eq!(item.bytes_completed, item.total_bytes, "{} complete with bytes left", item.item_name);
                }
                state.items.insert(item.tracking_id, item.clone());
            }

            state.last_totals = (updates.total_bytes, updates.total_bytes_completed);
        }

        self.inner.register_updates(updates).await;
    }
}
