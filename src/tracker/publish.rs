// Build an immutable snapshot of all Tracked records and publish it to watchers.

use std::sync::Arc;

use super::{SharedRecord, Tracker, now_ms};
use crate::models::Snapshot;

impl Tracker {
    /// Copy every Tracked record (one record lock at a time) into a new snapshot and make it
    /// the current one. Readers holding the previous snapshot keep it unchanged.
    pub(crate) async fn publish(&self, tick: u64) -> Arc<Snapshot> {
        let shared: Vec<SharedRecord> = self.records.read().await.values().cloned().collect();

        let mut containers = Vec::with_capacity(shared.len());
        for record in shared {
            let record = record.lock().await;
            if record.state().is_tracked() {
                containers.push(record.to_snapshot());
            }
        }
        containers.sort_by(|a, b| {
            a.info
                .name
                .cmp(&b.info.name)
                .then_with(|| a.info.id.cmp(&b.info.id))
        });

        let health = self.health.lock().await.clone();
        let daemon = self.daemon.lock().await.clone();
        let snapshot = Arc::new(Snapshot {
            tick,
            taken_at_ms: now_ms(),
            stale_since_ms: health.stale_since_ms,
            source_error: health.last_error,
            daemon,
            containers,
        });
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }
}
