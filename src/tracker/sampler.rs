// Fetch one raw sample per tracked container with bounded concurrency and per-request timeouts.

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use super::record::FailureOutcome;
use super::{SharedRecord, Tracker};
use crate::error::SourceError;
use crate::models::ContainerId;
use crate::normalizer::Normalized;

/// Per-tick sampling counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleReport {
    pub requested: usize,
    pub rates: usize,
    /// First sample after tracking started or after a counter reset.
    pub baselines: usize,
    pub counter_resets: usize,
    /// Samples dropped because their timestamp did not advance.
    pub discarded: usize,
    pub failures: usize,
    /// Records moved to Retiring by repeated failures this tick.
    pub retired: Vec<ContainerId>,
}

impl Tracker {
    /// Sample every Tracked record. Failures are isolated to their own record; a
    /// slow container costs at most one timeout and never delays the others' updates.
    pub(crate) async fn sample_all(&self) -> SampleReport {
        let targets: Vec<(ContainerId, String, SharedRecord)> = {
            let records = self.records.read().await;
            let mut targets = Vec::with_capacity(records.len());
            for (id, shared) in records.iter() {
                let record = shared.lock().await;
                if record.state().is_tracked() {
                    targets.push((id.clone(), record.info().name.clone(), shared.clone()));
                }
            }
            targets
        };

        let mut report = SampleReport {
            requested: targets.len(),
            ..Default::default()
        };
        let timeout = self.config.sample_timeout();
        let threshold = self.config.failure_retire_threshold;
        let source = &self.source;

        let mut results = stream::iter(targets)
            .map(|(id, name, shared)| async move {
                let result = match tokio::time::timeout(timeout, source.get_stats(&id, timeout)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout(timeout.as_millis() as u64)),
                };
                (id, name, shared, result)
            })
            .buffer_unordered(self.config.max_concurrent_samples);

        while let Some((id, name, shared, result)) = results.next().await {
            let mut record = shared.lock().await;
            let raw = match result {
                Ok(raw) if raw.id == id => raw,
                Ok(raw) => {
                    warn!(container = %name, got = %raw.id.short(), "stats response for a different container");
                    report.failures += 1;
                    continue;
                }
                Err(e) => {
                    report.failures += 1;
                    match record.apply_failure(&e, threshold) {
                        FailureOutcome::Retired => {
                            warn!(
                                container = %name,
                                error = %e,
                                failures = record.consecutive_failures,
                                "stats failing repeatedly; retiring container"
                            );
                            report.retired.push(id);
                        }
                        FailureOutcome::Counted(n) => {
                            warn!(container = %name, error = %e, failures = n, "stats fetch failed");
                        }
                        FailureOutcome::NotCounted => {
                            warn!(container = %name, error = %e, "stats fetch failed");
                        }
                    }
                    continue;
                }
            };
            match record.apply_sample(raw) {
                Normalized::Rate(_) => report.rates += 1,
                Normalized::Baseline => report.baselines += 1,
                Normalized::CounterReset => {
                    debug!(container = %name, "cumulative counter went backwards; new baseline");
                    report.counter_resets += 1;
                }
                Normalized::NonIncreasingTime => {
                    debug!(container = %name, "sample timestamp did not advance; discarded");
                    report.discarded += 1;
                }
            }
        }

        report
    }
}
