use crate::models::NotificationSettings;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// An application's joined limits and usage for the current day.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    pub app_id: String,
    pub user_id: String,
    pub name: String,
    pub daily_limit: i64,
    pub notification_settings: NotificationSettings,
    pub success: i64,
    pub failure: i64,
}

impl UsageEntry {
    /// Relays of either outcome, the figure notifications are based on.
    pub fn total(&self) -> i64 {
        self.success + self.failure
    }
}

/// Result of one completed refresh cycle. Never mutated after publishing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub app_ids_passed_limit: Vec<String>,
    pub usage: Vec<UsageEntry>,
    /// `None` for the empty snapshot a store starts with.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Single-slot holder of the latest [`Snapshot`].
///
/// Readers get an `Arc` to one complete snapshot and never block on a
/// refresh; a publish swaps the whole value at once.
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snapshot_of(n: usize) -> Snapshot {
        Snapshot {
            app_ids_passed_limit: (0..n).map(|i| format!("app-{n}-{i}")).collect(),
            usage: Vec::new(),
            refreshed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = SnapshotStore::new();
        let snapshot = store.load();
        assert!(snapshot.app_ids_passed_limit.is_empty());
        assert!(snapshot.refreshed_at.is_none());
    }

    #[test]
    fn test_readers_keep_their_snapshot_across_publish() {
        let store = SnapshotStore::new();
        store.publish(snapshot_of(2));

        let held = store.load();
        store.publish(snapshot_of(5));

        assert_eq!(held.app_ids_passed_limit.len(), 2);
        assert_eq!(store.load().app_ids_passed_limit.len(), 5);
    }

    #[test]
    fn test_concurrent_reads_see_whole_snapshots() {
        let store = Arc::new(SnapshotStore::new());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 1..200 {
                    store.publish(snapshot_of(n));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = store.load();
                        let n = snapshot.app_ids_passed_limit.len();
                        // Every id in a snapshot was produced by the same publish.
                        for id in &snapshot.app_ids_passed_limit {
                            assert!(id.starts_with(&format!("app-{n}-")));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
