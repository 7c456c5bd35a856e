use std::fmt::Debug;
use std::sync::Arc;

use ulid::Ulid;

/// Progress of a single tracked item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemProgressUpdate {
    /// A unique id for when the name is not enough to identify a single item.
    pub tracking_id: Ulid,

    pub item_name: Arc<str>,

    // The total bytes in this item, independent from the total bytes of all items.
    pub total_bytes: u64,

    // Bytes completed so far, as last reported by the transfer.
    pub bytes_completed: u64,

    /// Completion in whole percent, [0, 100].
    pub percentage: u8,
}

/// A report of the progress across all tracked items.
///
/// The totals describe every item tracked at the time of the update, while `item_updates`
/// only carries the items that changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressUpdate {
    pub item_updates: Vec<ItemProgressUpdate>,

    /// The total bytes known to process.
    pub total_bytes: u64,

    /// The total bytes that have been processed.
    pub total_bytes_completed: u64,
}

impl ProgressUpdate {
    pub fn is_empty(&self) -> bool {
        self.item_updates.is_empty()
    }

    /// Overall completion in whole percent; an empty batch counts as complete.
    pub fn completion_percentage(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        ((self.total_bytes_completed as f64 / self.total_bytes as f64) * 100.0)
            .round()
            .min(100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, total: u64, done: u64, percentage: u8) -> ItemProgressUpdate {
        ItemProgressUpdate {
            tracking_id: Ulid::new(),
            item_name: name.into(),
            total_bytes: total,
            bytes_completed: done,
            percentage,
        }
    }

    #[test]
    fn test_completion_percentage() {
        let update = ProgressUpdate {
            item_updates: vec![item("a", 200, 50, 25)],
            total_bytes: 300,
            total_bytes_completed: 100,
        };
        assert_eq!(update.completion_percentage(), 33);
        assert_eq!(ProgressUpdate::default().completion_percentage(), 100);
    }
}
