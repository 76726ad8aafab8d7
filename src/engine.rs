// Engine API for consumers: start/stop the periodic driver, read snapshots and history.

use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::models::{ContainerId, RateSample, Snapshot};
use crate::source::StatsSource;
use crate::tracker::Tracker;
use crate::worker::{self, WorkerConfig};

/// A running sampling engine. Owns its record map and configuration; there is no global state.
///
/// Must be started from within a Tokio runtime. Dropping an engine without calling
/// [`Engine::stop`] aborts the driver task.
pub struct Engine {
    tracker: Arc<Tracker>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Engine {
    /// Validate `config` and spawn the periodic driver. The first tick runs immediately.
    pub fn start(config: EngineConfig, source: Arc<dyn StatsSource>) -> Result<Self, ConfigError> {
        let poll_interval = config.poll_interval();
        let tracker = Arc::new(Tracker::new(config, source)?);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = worker::spawn(tracker.clone(), WorkerConfig { poll_interval }, shutdown_rx);
        info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            history_capacity = tracker.config().history_capacity,
            max_concurrent_samples = tracker.config().max_concurrent_samples,
            "engine started"
        );
        Ok(Self {
            tracker,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Cancel the driver and any in-flight requests, and wait for the task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "engine driver ended abnormally");
        }
        info!("engine stopped");
    }

    /// Latest published snapshot. Repeated calls between ticks return the same data.
    pub fn get_snapshot(&self) -> Arc<Snapshot> {
        self.tracker.latest_snapshot()
    }

    /// Ordered history (oldest first) for a known container, tracked or retiring.
    pub async fn get_history(&self, id: &ContainerId) -> Option<Vec<RateSample>> {
        self.tracker.history(id).await
    }

    /// Receiver notified each time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tracker.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
