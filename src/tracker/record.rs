// Per-container tracking record: lifecycle, rate baseline, latest rate and history

use crate::error::SourceError;
use crate::history::HistoryRing;
use crate::models::{ContainerInfo, ContainerSnapshot, LifecycleState, RateSample, RawSample, RetireReason};
use crate::normalizer::{Normalized, normalize};

#[derive(Debug)]
pub struct ContainerRecord {
    pub(crate) info: ContainerInfo,
    pub(crate) state: LifecycleState,
    /// Consecutive reconciliations in which the runtime did not list this container.
    pub(crate) absent_ticks: u32,
    pub(crate) baseline: Option<RawSample>,
    pub(crate) latest: Option<RateSample>,
    pub(crate) history: HistoryRing,
    pub(crate) consecutive_failures: u32,
    pub(crate) last_error: Option<String>,
}

/// What applying a stats failure did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureOutcome {
    Counted(u32),
    Retired,
    NotCounted,
}

impl ContainerRecord {
    pub fn new(info: ContainerInfo, history_capacity: usize) -> Self {
        Self {
            info,
            state: LifecycleState::Tracked,
            absent_ticks: 0,
            baseline: None,
            latest: None,
            history: HistoryRing::new(history_capacity),
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    /// Feed one successful raw sample through the normalizer. The baseline, latest rate and
    /// history are updated together under the caller's lock.
    pub(crate) fn apply_sample(&mut self, raw: RawSample) -> Normalized {
        let outcome = normalize(self.baseline.as_ref(), &raw);
        if let Normalized::Rate(rate) = &outcome {
            self.history.append(rate.clone());
            self.latest = Some(rate.clone());
        }
        if outcome.advances_baseline() {
            self.baseline = Some(raw);
        }
        self.consecutive_failures = 0;
        self.last_error = None;
        outcome
    }

    /// Record a failed fetch. The latest rate stays as it was (stale but present).
    pub(crate) fn apply_failure(&mut self, err: &SourceError, retire_threshold: u32) -> FailureOutcome {
        self.last_error = Some(err.to_string());
        if !err.counts_toward_retirement() {
            return FailureOutcome::NotCounted;
        }
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= retire_threshold {
            self.state = LifecycleState::Retiring(RetireReason::SampleFailures);
            FailureOutcome::Retired
        } else {
            FailureOutcome::Counted(self.consecutive_failures)
        }
    }

    /// Runtime lists this container again. A listing without a start time (inspect failed or
    /// timed out) keeps the inspect-derived fields already known.
    pub(crate) fn mark_present(&mut self, mut info: ContainerInfo) {
        if info.started_at.is_none() {
            info.started_at = self.info.started_at;
            info.restart_count = self.info.restart_count;
            info.health = self.info.health.take();
        }
        self.info = info;
        self.absent_ticks = 0;
        if let LifecycleState::Retiring(reason) = self.state {
            self.state = LifecycleState::Tracked;
            if reason == RetireReason::SampleFailures {
                self.consecutive_failures = 0;
            }
        }
    }

    /// Runtime no longer lists this container. Returns true when the record should be removed.
    pub(crate) fn mark_absent(&mut self, grace_ticks: u32) -> bool {
        self.absent_ticks = self.absent_ticks.saturating_add(1);
        match self.state {
            LifecycleState::Retiring(RetireReason::SampleFailures) => true,
            _ => {
                self.state = LifecycleState::Retiring(RetireReason::Absent);
                self.absent_ticks >= grace_ticks
            }
        }
    }

    pub(crate) fn to_snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            info: self.info.clone(),
            latest: self.latest.clone(),
            history: self.history.snapshot(),
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.clone(),
        }
    }
}
