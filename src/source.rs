// Raw stats source contract: what the engine needs from a container runtime.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SourceError;
use crate::models::{ContainerId, ContainerInfo, DaemonInfo, RawSample};

/// A container runtime exposing running containers and their cumulative counters.
///
/// Implementations are treated as slow and unreliable: every call may fail, and
/// `get_stats` must give up after `timeout`.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Currently running containers. Fails with `Unavailable` when the runtime is unreachable.
    async fn list_running_containers(&self) -> Result<Vec<ContainerInfo>, SourceError>;

    /// One raw sample for `id`. Fails with `NotFound`, `Timeout` or `Unavailable`.
    async fn get_stats(&self, id: &ContainerId, timeout: Duration)
    -> Result<RawSample, SourceError>;

    /// Host-level summary. Sources without one report None.
    async fn daemon_info(&self) -> Result<Option<DaemonInfo>, SourceError> {
        Ok(None)
    }

    /// Connectivity check.
    async fn ping(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
