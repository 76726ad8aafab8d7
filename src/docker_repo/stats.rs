// Reduce a raw Docker stats API response to the cumulative counters the engine rates.

use bollard::models::{ContainerNetworkStats, ContainerStatsResponse};
use std::collections::HashMap;

use crate::models::{ContainerId, RawSample};

/// Memory stat keys differ between cgroup v1 and v2; the first key present wins.
const CACHE_KEYS: &[&str] = &["cache", "file"];
const SWAP_KEYS: &[&str] = &["swap"];
const OOM_KILL_KEYS: &[&str] = &["oom_kills", "oom_kill"];

/// Build a RawSample from a one-shot stats response. None when CPU counters are missing
/// (the daemon answers with an empty body for containers that are shutting down).
pub(crate) fn raw_sample(
    s: &ContainerStatsResponse,
    id: &ContainerId,
    timestamp_ns: u64,
) -> Option<RawSample> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let cpu_total_ns = cpu_usage.total_usage?;
    let online_cpus = cpu_stats.online_cpus.map(|n| n as u32).unwrap_or(1).max(1);
    let throttling = cpu_stats.throttling_data.as_ref();

    let memory = s.memory_stats.as_ref();
    let memory_stat = |keys: &[&str]| {
        memory
            .and_then(|m| m.stats.as_ref())
            .and_then(|stats| keys.iter().find_map(|k| stats.get(*k).copied()))
            .unwrap_or(0)
    };

    let net = s.networks.as_ref().map(sum_networks).unwrap_or_default();

    let (block_read_bytes, block_write_bytes) = s
        .blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map_or((0u64, 0u64), |b| {
            let mut read = 0u64;
            let mut write = 0u64;
            for e in b {
                let Some(op) = e.op.as_deref() else {
                    continue;
                };
                if op.eq_ignore_ascii_case("read") {
                    read = read.saturating_add(e.value.unwrap_or(0));
                } else if op.eq_ignore_ascii_case("write") {
                    write = write.saturating_add(e.value.unwrap_or(0));
                }
            }
            (read, write)
        });

    let pids = s.pids_stats.as_ref().and_then(|p| p.current).unwrap_or(0);

    Some(RawSample {
        id: id.clone(),
        timestamp_ns,
        cpu_total_ns,
        cpu_kernel_ns: cpu_usage.usage_in_kernelmode.unwrap_or(0),
        cpu_user_ns: cpu_usage.usage_in_usermode.unwrap_or(0),
        online_cpus,
        cpu_throttled_periods: throttling.and_then(|t| t.throttled_periods).unwrap_or(0),
        cpu_throttled_time_ns: throttling.and_then(|t| t.throttled_time).unwrap_or(0),
        memory_usage_bytes: memory.and_then(|m| m.usage).unwrap_or(0),
        memory_limit_bytes: memory.and_then(|m| m.limit).unwrap_or(0),
        memory_cache_bytes: memory_stat(CACHE_KEYS),
        memory_swap_bytes: memory_stat(SWAP_KEYS),
        oom_kills: memory_stat(OOM_KILL_KEYS),
        network_rx_bytes: net.rx_bytes,
        network_tx_bytes: net.tx_bytes,
        network_rx_errors: net.rx_errors,
        network_tx_errors: net.tx_errors,
        network_rx_dropped: net.rx_dropped,
        network_tx_dropped: net.tx_dropped,
        block_read_bytes,
        block_write_bytes,
        pids,
    })
}

/// Daemon-side capture time of the response (`read`), unix nanoseconds.
/// None when absent, unparsable, or the zero time Docker sends before the first read.
pub(crate) fn read_timestamp_ns(s: &ContainerStatsResponse) -> Option<u64> {
    let read = s.read.as_deref()?;
    let ts = chrono::DateTime::parse_from_rfc3339(read).ok()?;
    ts.timestamp_nanos_opt()
        .filter(|ns| *ns > 0)
        .map(|ns| ns as u64)
}

#[derive(Debug, Default)]
struct NetworkTotals {
    rx_bytes: u64,
    tx_bytes: u64,
    rx_errors: u64,
    tx_errors: u64,
    rx_dropped: u64,
    tx_dropped: u64,
}

fn sum_networks(networks: &HashMap<String, ContainerNetworkStats>) -> NetworkTotals {
    networks
        .values()
        .fold(NetworkTotals::default(), |mut t, v| {
            t.rx_bytes = t.rx_bytes.saturating_add(v.rx_bytes.unwrap_or(0));
            t.tx_bytes = t.tx_bytes.saturating_add(v.tx_bytes.unwrap_or(0));
            t.rx_errors = t.rx_errors.saturating_add(v.rx_errors.unwrap_or(0));
            t.tx_errors = t.tx_errors.saturating_add(v.tx_errors.unwrap_or(0));
            t.rx_dropped = t.rx_dropped.saturating_add(v.rx_dropped.unwrap_or(0));
            t.tx_dropped = t.tx_dropped.saturating_add(v.tx_dropped.unwrap_or(0));
            t
        })
}
