// Periodic driver: one reconcile + sample + publish per poll interval until shutdown.
// Shutdown cancels an in-flight tick; dropping the tick future drops its pending requests.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

use crate::tracker::{TickReport, Tracker};

/// Repeat "runtime unreachable" at WARN at most this often while degraded.
const DEGRADED_WARN_INTERVAL: Duration = Duration::from_secs(60);

pub struct WorkerConfig {
    pub poll_interval: Duration,
}

pub fn spawn(
    tracker: Arc<Tracker>,
    config: WorkerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        poll_interval_ms = config.poll_interval.as_millis() as u64
    );

    tokio::spawn(
        async move {
            let mut tick = interval(config.poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last_degraded_warn: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        tokio::select! {
                            report = tracker.run_tick() => {
                                log_tick(&report, &mut last_degraded_warn);
                            }
                            _ = &mut shutdown_rx => {
                                tracing::debug!("Worker cancelled mid-tick");
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Worker shutting down");
                        break;
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}

fn log_tick(report: &TickReport, last_degraded_warn: &mut Option<Instant>) {
    match &report.reconcile {
        Ok(reconcile) => {
            *last_degraded_warn = None;
            let sample = report.sample.as_ref();
            tracing::debug!(
                tick = report.tick,
                live = reconcile.live,
                added = reconcile.added.len(),
                removed = reconcile.removed.len(),
                retiring = reconcile.retiring.len(),
                sampled = sample.map_or(0, |s| s.requested),
                rates = sample.map_or(0, |s| s.rates),
                failures = sample.map_or(0, |s| s.failures),
                "tick complete"
            );
        }
        Err(e) => {
            let should_warn =
                last_degraded_warn.is_none_or(|t| t.elapsed() >= DEGRADED_WARN_INTERVAL);
            if should_warn {
                tracing::warn!(
                    tick = report.tick,
                    error = %e,
                    operation = "list_running_containers",
                    "container runtime unreachable; keeping last known data"
                );
                *last_degraded_warn = Some(Instant::now());
            } else {
                tracing::debug!(tick = report.tick, error = %e, "container runtime still unreachable");
            }
        }
    }
}
