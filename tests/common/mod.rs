// Shared test helpers: a scriptable in-memory stats source

#![allow(dead_code)]

use async_trait::async_trait;
use container_pulse::config::EngineConfig;
use container_pulse::error::SourceError;
use container_pulse::models::{ContainerId, ContainerInfo, DaemonInfo, RawSample};
use container_pulse::source::StatsSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone)]
enum StatsBehavior {
    Sample(RawSample),
    Fail(SourceError),
    Hang,
}

#[derive(Default)]
struct FakeState {
    running: Vec<ContainerInfo>,
    list_error: Option<SourceError>,
    stats: HashMap<ContainerId, StatsBehavior>,
    stats_calls: HashMap<ContainerId, usize>,
    list_calls: usize,
    daemon: Option<Result<DaemonInfo, SourceError>>,
}

/// In-memory runtime. Every call returns whatever was last scripted for it.
#[derive(Default)]
pub struct FakeSource {
    state: Mutex<FakeState>,
    stats_delay: Mutex<Option<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter when a request completes or is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_running(&self, running: Vec<ContainerInfo>) {
        self.state.lock().unwrap().running = running;
    }

    pub fn fail_list(&self, err: SourceError) {
        self.state.lock().unwrap().list_error = Some(err);
    }

    pub fn clear_list_failure(&self) {
        self.state.lock().unwrap().list_error = None;
    }

    pub fn set_sample(&self, sample: RawSample) {
        let id = sample.id.clone();
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(id, StatsBehavior::Sample(sample));
    }

    pub fn fail_stats(&self, id: &str, err: SourceError) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(ContainerId::new(id), StatsBehavior::Fail(err));
    }

    pub fn hang_stats(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(ContainerId::new(id), StatsBehavior::Hang);
    }

    pub fn set_daemon_info(&self, info: DaemonInfo) {
        self.state.lock().unwrap().daemon = Some(Ok(info));
    }

    pub fn fail_daemon_info(&self, err: SourceError) {
        self.state.lock().unwrap().daemon = Some(Err(err));
    }

    /// Every successful stats call sleeps this long first.
    pub fn set_stats_delay(&self, delay: Duration) {
        *self.stats_delay.lock().unwrap() = Some(delay);
    }

    pub fn stats_calls(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .stats_calls
            .get(&ContainerId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for FakeSource {
    async fn list_running_containers(&self) -> Result<Vec<ContainerInfo>, SourceError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        match &state.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.running.clone()),
        }
    }

    async fn daemon_info(&self) -> Result<Option<DaemonInfo>, SourceError> {
        match &self.state.lock().unwrap().daemon {
            Some(Ok(info)) => Ok(Some(info.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(None),
        }
    }

    async fn get_stats(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<RawSample, SourceError> {
        let behavior = {
            let mut state = self.state.lock().unwrap();
            *state.stats_calls.entry(id.clone()).or_default() += 1;
            state
                .stats
                .get(id)
                .cloned()
                .unwrap_or_else(|| StatsBehavior::Fail(SourceError::NotFound(id.to_string())))
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        let delay = *self.stats_delay.lock().unwrap();
        match behavior {
            StatsBehavior::Sample(sample) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(sample)
            }
            StatsBehavior::Fail(e) => Err(e),
            StatsBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

pub fn info(id: &str, name: &str) -> ContainerInfo {
    ContainerInfo::new(id, name, "alpine:latest")
}

pub fn info_started(id: &str, name: &str, started_at: i64) -> ContainerInfo {
    ContainerInfo {
        started_at: Some(started_at),
        ..info(id, name)
    }
}

/// Raw sample with the given wall time (seconds) and cumulative CPU time (ns).
pub fn raw(id: &str, secs: u64, cpu_ns: u64) -> RawSample {
    RawSample {
        cpu_total_ns: cpu_ns,
        ..RawSample::zeroed(id, secs * SEC)
    }
}

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        poll_interval_secs: 2.0,
        history_capacity: 60,
        retire_grace_ticks: 3,
        max_concurrent_samples: 16,
        failure_retire_threshold: 3,
        sample_timeout_ms: None,
    }
}
