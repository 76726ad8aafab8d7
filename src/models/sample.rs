// Raw cumulative counters and the normalized rates derived from them

use serde::{Deserialize, Serialize};

use super::ContainerId;

/// Point-in-time counters for one container, as read from the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    pub id: ContainerId,
    /// Capture time, unix nanoseconds.
    pub timestamp_ns: u64,
    /// Cumulative CPU time consumed, nanoseconds.
    pub cpu_total_ns: u64,
    #[serde(default)]
    pub cpu_kernel_ns: u64,
    #[serde(default)]
    pub cpu_user_ns: u64,
    pub online_cpus: u32,
    /// CFS periods in which the container hit its quota.
    #[serde(default)]
    pub cpu_throttled_periods: u64,
    #[serde(default)]
    pub cpu_throttled_time_ns: u64,
    pub memory_usage_bytes: u64,
    #[serde(default)]
    pub memory_limit_bytes: u64,
    #[serde(default)]
    pub memory_cache_bytes: u64,
    #[serde(default)]
    pub memory_swap_bytes: u64,
    #[serde(default)]
    pub oom_kills: u64,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
    #[serde(default)]
    pub network_rx_errors: u64,
    #[serde(default)]
    pub network_tx_errors: u64,
    #[serde(default)]
    pub network_rx_dropped: u64,
    #[serde(default)]
    pub network_tx_dropped: u64,
    pub block_read_bytes: u64,
    pub block_write_bytes: u64,
    #[serde(default)]
    pub pids: u64,
}

impl RawSample {
    /// Sample with every counter at zero; tests and fakes fill in the fields they care about.
    pub fn zeroed(id: impl Into<ContainerId>, timestamp_ns: u64) -> Self {
        Self {
            id: id.into(),
            timestamp_ns,
            cpu_total_ns: 0,
            cpu_kernel_ns: 0,
            cpu_user_ns: 0,
            online_cpus: 1,
            cpu_throttled_periods: 0,
            cpu_throttled_time_ns: 0,
            memory_usage_bytes: 0,
            memory_limit_bytes: 0,
            memory_cache_bytes: 0,
            memory_swap_bytes: 0,
            oom_kills: 0,
            network_rx_bytes: 0,
            network_tx_bytes: 0,
            network_rx_errors: 0,
            network_tx_errors: 0,
            network_rx_dropped: 0,
            network_tx_dropped: 0,
            block_read_bytes: 0,
            block_write_bytes: 0,
            pids: 0,
        }
    }

    pub fn block_total_bytes(&self) -> u64 {
        self.block_read_bytes.saturating_add(self.block_write_bytes)
    }
}

/// Rates derived from two consecutive raw samples of the same container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSample {
    pub id: ContainerId,
    /// Timestamp of the later raw sample, unix nanoseconds.
    pub timestamp_ns: u64,
    /// 0 ..= 100 * online_cpus.
    pub cpu_percent: f64,
    #[serde(default)]
    pub cpu_kernel_percent: f64,
    #[serde(default)]
    pub cpu_user_percent: f64,
    #[serde(default)]
    pub cpu_throttled_periods_per_sec: f64,
    /// Share of wall time spent throttled.
    #[serde(default)]
    pub cpu_throttled_percent: f64,
    /// Instantaneous, not a rate.
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
    #[serde(default)]
    pub memory_cache_bytes: u64,
    #[serde(default)]
    pub memory_swap_bytes: u64,
    /// Cumulative count as reported by the runtime.
    #[serde(default)]
    pub oom_kills: u64,
    pub network_rx_bytes_per_sec: f64,
    pub network_tx_bytes_per_sec: f64,
    #[serde(default)]
    pub network_rx_errors_per_sec: f64,
    #[serde(default)]
    pub network_tx_errors_per_sec: f64,
    #[serde(default)]
    pub network_rx_dropped_per_sec: f64,
    #[serde(default)]
    pub network_tx_dropped_per_sec: f64,
    pub block_read_bytes_per_sec: f64,
    pub block_write_bytes_per_sec: f64,
    pub pids: u64,
}

impl RateSample {
    pub fn block_bytes_per_sec(&self) -> f64 {
        self.block_read_bytes_per_sec + self.block_write_bytes_per_sec
    }
}
