// Daemon-wide facts reported alongside per-container samples

use serde::{Deserialize, Serialize};

/// Container runtime host summary, refreshed once per healthy tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonInfo {
    pub server_version: String,
    pub operating_system: String,
    pub kernel_version: String,
    pub cpu_count: u64,
    pub memory_total_bytes: u64,
    pub containers_running: u64,
    pub containers_paused: u64,
    pub containers_stopped: u64,
    pub images: u64,
}
