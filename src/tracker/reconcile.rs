// Diff the runtime's live container list against tracked records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ContainerRecord, Tracker};
use crate::error::SourceError;
use crate::models::{ContainerId, ContainerInfo};

/// Membership changes made by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub live: usize,
    pub added: Vec<ContainerId>,
    /// Same id, new start time: history and baseline discarded.
    pub restarted: Vec<ContainerId>,
    /// Old ids whose name now belongs to a new container instance.
    pub replaced: Vec<ContainerId>,
    /// Missing this tick but still inside the grace window.
    pub retiring: Vec<ContainerId>,
    /// Back from Retiring to Tracked.
    pub restored: Vec<ContainerId>,
    pub removed: Vec<ContainerId>,
}

impl Tracker {
    /// Fetch the live list and apply creations, retirements, restarts and removals.
    /// On a failed fetch nothing is touched.
    pub(crate) async fn reconcile(&self) -> Result<ReconcileReport, SourceError> {
        let budget = self.config.sample_timeout();
        let live = tokio::time::timeout(budget, self.source.list_running_containers())
            .await
            .map_err(|_| SourceError::Timeout(budget.as_millis() as u64))??;

        let grace = self.config.retire_grace_ticks;
        let capacity = self.config.history_capacity;
        let mut report = ReconcileReport {
            live: live.len(),
            ..Default::default()
        };
        let mut live_by_id: HashMap<ContainerId, ContainerInfo> =
            live.into_iter().map(|c| (c.id.clone(), c)).collect();

        let mut records = self.records.write().await;
        let mut removals: HashSet<ContainerId> = HashSet::new();
        let mut restarts: Vec<ContainerInfo> = Vec::new();
        let mut absent_by_name: HashMap<String, ContainerId> = HashMap::new();

        for (id, shared) in records.iter() {
            let mut record = shared.lock().await;
            match live_by_id.remove(id) {
                Some(info) if record.info().restarted_as(&info) => {
                    restarts.push(info);
                }
                Some(info) => {
                    let was_retiring = !record.state().is_tracked();
                    record.mark_present(info);
                    if was_retiring {
                        info!(container = %record.info().name, "container back in live list");
                        report.restored.push(id.clone());
                    }
                }
                None => {
                    absent_by_name.insert(record.info().name.clone(), id.clone());
                    if record.mark_absent(grace) {
                        removals.insert(id.clone());
                    } else {
                        debug!(
                            container = %record.info().name,
                            absent_ticks = record.absent_ticks,
                            grace_ticks = grace,
                            "container missing from live list"
                        );
                        report.retiring.push(id.clone());
                    }
                }
            }
        }

        for info in restarts {
            info!(container = %info.name, id = %info.id.short(), "container restarted; history reset");
            report.restarted.push(info.id.clone());
            records.insert(
                info.id.clone(),
                Arc::new(Mutex::new(ContainerRecord::new(info, capacity))),
            );
        }

        for (id, info) in live_by_id {
            if let Some(old_id) = absent_by_name.remove(&info.name) {
                info!(
                    container = %info.name,
                    old_id = %old_id.short(),
                    new_id = %id.short(),
                    "container recreated under same name; history reset"
                );
                report.retiring.retain(|r| r != &old_id);
                removals.remove(&old_id);
                records.remove(&old_id);
                report.replaced.push(old_id);
            } else {
                info!(container = %info.name, id = %id.short(), image = %info.image, "tracking container");
            }
            report.added.push(id.clone());
            records.insert(id, Arc::new(Mutex::new(ContainerRecord::new(info, capacity))));
        }

        for id in removals {
            if let Some(shared) = records.remove(&id) {
                let record = shared.lock().await;
                info!(container = %record.info().name, id = %id.short(), "container retired");
            }
            report.removed.push(id);
        }

        Ok(report)
    }
}
