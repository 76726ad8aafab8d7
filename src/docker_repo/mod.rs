// Docker container list and one-shot stats via bollard

mod stats;

use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::query_parameters::{InspectContainerOptions, ListContainersOptions, StatsOptions};
use bollard::models::{ContainerInspectResponse, ContainerSummary, SystemInfo};
use futures_util::StreamExt;
use futures_util::stream;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, warn};

use crate::config::DockerConfig;
use crate::error::SourceError;
use crate::models::{ContainerId, ContainerInfo, DaemonInfo, RawSample};
use crate::source::StatsSource;

/// Concurrent inspect calls while building the running-container list.
const INSPECT_CONCURRENCY: usize = 16;
const DEFAULT_INSPECT_TIMEOUT: Duration = Duration::from_secs(1);

pub struct DockerRepo {
    docker: Docker,
    inspect_timeout: Duration,
}

impl DockerRepo {
    /// Connect using bollard's unix defaults, or an explicit socket path from config.
    pub fn connect(config: &DockerConfig) -> Result<Self, SourceError> {
        let docker = match &config.socket {
            Some(path) => {
                Docker::connect_with_socket(path, config.timeout_secs, bollard::API_DEFAULT_VERSION)
            }
            None => Docker::connect_with_unix_defaults(),
        }
        .map_err(map_bollard_error)?;
        let inspect_timeout = config
            .inspect_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INSPECT_TIMEOUT);
        Ok(Self {
            docker,
            inspect_timeout,
        })
    }

    pub fn with_inspect_timeout(mut self, timeout: Duration) -> Self {
        self.inspect_timeout = timeout;
        self
    }

    async fn inspect_info(&self, summary: ContainerSummary) -> Option<ContainerInfo> {
        let info = summary_info(summary)?;
        let id = info.id.clone();
        let inspect = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>);
        complete_info(info, self.inspect_timeout, inspect).await
    }
}

/// Identity from the list entry alone. None for entries without an id.
fn summary_info(summary: ContainerSummary) -> Option<ContainerInfo> {
    let id = summary.id.filter(|id| !id.is_empty())?;
    let name = summary
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let image = summary.image.unwrap_or_default();
    Some(ContainerInfo::new(id, name, image))
}

/// Fill in start time, restart count and health from an inspect call bounded by `budget`.
/// None when the container vanished between list and inspect; a slow or failed inspect
/// keeps the list-only info so the container is still reconciled this tick.
async fn complete_info<F>(
    mut info: ContainerInfo,
    budget: Duration,
    inspect: F,
) -> Option<ContainerInfo>
where
    F: Future<Output = Result<ContainerInspectResponse, BollardError>>,
{
    let details = match tokio::time::timeout(budget, inspect).await {
        Ok(Ok(details)) => details,
        Ok(Err(e)) => {
            return match map_bollard_error(e) {
                SourceError::NotFound(_) => {
                    debug!(container = %info.name, "container gone before inspect");
                    None
                }
                other => {
                    warn!(container = %info.name, error = %other, "inspect_container failed");
                    Some(info)
                }
            };
        }
        Err(_) => {
            warn!(
                container = %info.name,
                timeout_ms = budget.as_millis() as u64,
                "inspect_container timed out"
            );
            return Some(info);
        }
    };

    let state = details.state.as_ref();
    info.started_at = state
        .and_then(|s| s.started_at.as_deref())
        .and_then(parse_started_at);
    info.health = state
        .and_then(|s| s.health.as_ref())
        .and_then(|h| h.status.as_ref())
        .map(|status| status.to_string())
        .filter(|status| !status.is_empty());
    info.restart_count = details.restart_count.unwrap_or(0).max(0) as u64;
    Some(info)
}

#[async_trait]
impl StatsSource for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_running_containers"))]
    async fn list_running_containers(&self) -> Result<Vec<ContainerInfo>, SourceError> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(filter))
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let containers: Vec<ContainerInfo> = stream::iter(summaries)
            .map(|summary| self.inspect_info(summary))
            .buffer_unordered(INSPECT_CONCURRENCY)
            .filter_map(|info| async move { info })
            .collect()
            .await;
        Ok(containers)
    }

    #[instrument(skip(self, timeout), fields(repo = "docker", operation = "get_stats", container = %id.short()))]
    async fn get_stats(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<RawSample, SourceError> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id.as_str(), Some(options));
        let response = match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => return Err(SourceError::Timeout(timeout.as_millis() as u64)),
            Ok(None) => {
                return Err(SourceError::Unavailable(format!(
                    "stats stream for {} ended without a response",
                    id.short()
                )));
            }
            Ok(Some(Err(e))) => return Err(map_bollard_error(e)),
            Ok(Some(Ok(response))) => response,
        };
        let timestamp_ns = stats::read_timestamp_ns(&response).unwrap_or_else(now_ns);
        stats::raw_sample(&response, id, timestamp_ns).ok_or_else(|| {
            SourceError::Unavailable(format!("incomplete stats response for {}", id.short()))
        })
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "daemon_info"))]
    async fn daemon_info(&self) -> Result<Option<DaemonInfo>, SourceError> {
        let info = self.docker.info().await.map_err(map_bollard_error)?;
        Ok(Some(to_daemon_info(info)))
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "ping"))]
    async fn ping(&self) -> Result<(), SourceError> {
        self.docker.ping().await.map_err(map_bollard_error)?;
        Ok(())
    }
}

fn map_bollard_error(e: BollardError) -> SourceError {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => SourceError::NotFound(message),
        other => SourceError::Unavailable(other.to_string()),
    }
}

fn to_daemon_info(info: SystemInfo) -> DaemonInfo {
    let count = |n: Option<i64>| n.unwrap_or(0).max(0) as u64;
    DaemonInfo {
        server_version: info.server_version.unwrap_or_default(),
        operating_system: info.operating_system.unwrap_or_default(),
        kernel_version: info.kernel_version.unwrap_or_default(),
        cpu_count: count(info.ncpu),
        memory_total_bytes: count(info.mem_total),
        containers_running: count(info.containers_running),
        containers_paused: count(info.containers_paused),
        containers_stopped: count(info.containers_stopped),
        images: count(info.images),
    }
}

/// Docker reports never-started containers as year 1; treat anything before the epoch as unknown.
fn parse_started_at(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.timestamp_millis())
        .filter(|ms| *ms > 0)
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_else(|e| {
            warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
