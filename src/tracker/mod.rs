// Container record map shared by the reconciler (membership), the sampler (sample data)
// and the publisher (read-only). Lock order is always map, then record.

mod publish;
mod reconcile;
mod record;
mod sampler;

pub use reconcile::ReconcileReport;
pub use record::ContainerRecord;
pub use sampler::SampleReport;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock, watch};

use crate::config::EngineConfig;
use crate::error::{ConfigError, SourceError};
use crate::models::{ContainerId, DaemonInfo, LifecycleState, RateSample, Snapshot};
use crate::source::StatsSource;

pub(crate) type SharedRecord = Arc<Mutex<ContainerRecord>>;

/// Degraded-state bookkeeping for whole-tick failures.
#[derive(Debug, Clone, Default)]
struct SourceHealth {
    stale_since_ms: Option<u64>,
    last_error: Option<String>,
}

/// Outcome of one reconcile + sample + publish cycle.
#[derive(Debug)]
pub struct TickReport {
    pub tick: u64,
    pub reconcile: Result<ReconcileReport, SourceError>,
    /// None when reconciliation failed and sampling was skipped.
    pub sample: Option<SampleReport>,
}

/// Owns every container record for one engine instance and runs ticks against a stats source.
pub struct Tracker {
    source: Arc<dyn StatsSource>,
    config: EngineConfig,
    records: RwLock<HashMap<ContainerId, SharedRecord>>,
    health: Mutex<SourceHealth>,
    daemon: Mutex<Option<DaemonInfo>>,
    ticks: AtomicU64,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
}

impl Tracker {
    pub fn new(config: EngineConfig, source: Arc<dyn StatsSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot {
            taken_at_ms: now_ms(),
            ..Default::default()
        }));
        Ok(Self {
            source,
            config,
            records: RwLock::new(HashMap::new()),
            health: Mutex::new(SourceHealth::default()),
            daemon: Mutex::new(None),
            ticks: AtomicU64::new(0),
            snapshot_tx,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile, then sample (skipped when the live list could not be fetched), then publish.
    pub async fn run_tick(&self) -> TickReport {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let reconcile = self.reconcile().await;
        let sample = match &reconcile {
            Ok(_) => {
                self.mark_healthy().await;
                let (sample, ()) = tokio::join!(self.sample_all(), self.refresh_daemon_info());
                Some(sample)
            }
            Err(e) => {
                self.mark_degraded(e).await;
                None
            }
        };
        self.publish(tick).await;
        TickReport {
            tick,
            reconcile,
            sample,
        }
    }

    /// Most recently published snapshot. Never touches the record map.
    pub fn latest_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Ordered history for a tracked or retiring container; None for unknown ids.
    pub async fn history(&self, id: &ContainerId) -> Option<Vec<RateSample>> {
        let shared = self.records.read().await.get(id).cloned()?;
        let record = shared.lock().await;
        Some(record.history().snapshot())
    }

    pub async fn state_of(&self, id: &ContainerId) -> Option<LifecycleState> {
        let shared = self.records.read().await.get(id).cloned()?;
        let state = shared.lock().await.state();
        Some(state)
    }

    /// Last known daemon summary is kept when the call fails or times out.
    async fn refresh_daemon_info(&self) {
        let budget = self.config.sample_timeout();
        match tokio::time::timeout(budget, self.source.daemon_info()).await {
            Ok(Ok(Some(info))) => *self.daemon.lock().await = Some(info),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "daemon info unavailable"),
            Err(_) => tracing::debug!(timeout_ms = budget.as_millis() as u64, "daemon info timed out"),
        }
    }

    async fn mark_healthy(&self) {
        let mut health = self.health.lock().await;
        if let Some(since) = health.stale_since_ms.take() {
            tracing::info!(
                stale_for_ms = now_ms().saturating_sub(since),
                "container runtime reachable again"
            );
        }
        health.last_error = None;
    }

    async fn mark_degraded(&self, err: &SourceError) {
        let mut health = self.health.lock().await;
        health.stale_since_ms.get_or_insert_with(now_ms);
        health.last_error = Some(err.to_string());
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
