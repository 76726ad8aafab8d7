// Published, immutable view of every tracked container

use serde::{Deserialize, Serialize};

use super::{ContainerId, ContainerInfo, DaemonInfo, RateSample};

/// Point-in-time copy of engine state handed to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Number of completed ticks when this snapshot was built (0 = before the first tick).
    pub tick: u64,
    pub taken_at_ms: u64,
    /// Set while the runtime's live list cannot be fetched: data is stale since this instant.
    #[serde(default)]
    pub stale_since_ms: Option<u64>,
    #[serde(default)]
    pub source_error: Option<String>,
    /// Last known daemon summary, when the source reports one.
    #[serde(default)]
    pub daemon: Option<DaemonInfo>,
    pub containers: Vec<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    pub info: ContainerInfo,
    /// None until two good samples have been taken ("no data yet").
    pub latest: Option<RateSample>,
    /// Oldest first.
    pub history: Vec<RateSample>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Totals across all containers in a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub containers: usize,
    pub containers_with_data: usize,
    pub total_cpu_percent: f64,
    pub total_memory_bytes: u64,
    pub total_memory_limit_bytes: u64,
    pub total_network_rx_bytes_per_sec: f64,
    pub total_network_tx_bytes_per_sec: f64,
    pub total_block_bytes_per_sec: f64,
}

impl Snapshot {
    pub fn is_stale(&self) -> bool {
        self.stale_since_ms.is_some()
    }

    pub fn container(&self, id: &ContainerId) -> Option<&ContainerSnapshot> {
        self.containers.iter().find(|c| &c.info.id == id)
    }

    pub fn container_by_name(&self, name: &str) -> Option<&ContainerSnapshot> {
        self.containers.iter().find(|c| c.info.name == name)
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            containers: self.containers.len(),
            ..Default::default()
        };
        for latest in self.containers.iter().filter_map(|c| c.latest.as_ref()) {
            summary.containers_with_data += 1;
            summary.total_cpu_percent += latest.cpu_percent;
            summary.total_memory_bytes += latest.memory_usage_bytes;
            summary.total_memory_limit_bytes += latest.memory_limit_bytes;
            summary.total_network_rx_bytes_per_sec += latest.network_rx_bytes_per_sec;
            summary.total_network_tx_bytes_per_sec += latest.network_tx_bytes_per_sec;
            summary.total_block_bytes_per_sec += latest.block_bytes_per_sec();
        }
        summary
    }
}
