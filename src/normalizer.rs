// Turns two consecutive raw cumulative samples into rates (CPU %, bytes/sec).

use crate::models::{RateSample, RawSample};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Result of feeding one raw sample to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Both samples were usable; the current one becomes the new baseline.
    Rate(RateSample),
    /// No usable previous sample (first sample, or previous belongs to another container).
    /// The current sample becomes the baseline.
    Baseline,
    /// `cur` is not later than `prev`. The current sample is discarded and the baseline kept.
    NonIncreasingTime,
    /// A cumulative counter went backwards. The current sample becomes the baseline.
    CounterReset,
}

impl Normalized {
    /// Whether the sample that produced this outcome should replace the stored baseline.
    pub fn advances_baseline(&self) -> bool {
        !matches!(self, Normalized::NonIncreasingTime)
    }

    pub fn rate(&self) -> Option<&RateSample> {
        match self {
            Normalized::Rate(r) => Some(r),
            _ => None,
        }
    }
}

pub fn normalize(prev: Option<&RawSample>, cur: &RawSample) -> Normalized {
    let Some(prev) = prev else {
        return Normalized::Baseline;
    };
    if prev.id != cur.id {
        return Normalized::Baseline;
    }
    if cur.timestamp_ns <= prev.timestamp_ns {
        return Normalized::NonIncreasingTime;
    }

    let deltas = (
        cur.cpu_total_ns.checked_sub(prev.cpu_total_ns),
        cur.network_rx_bytes.checked_sub(prev.network_rx_bytes),
        cur.network_tx_bytes.checked_sub(prev.network_tx_bytes),
        cur.block_read_bytes.checked_sub(prev.block_read_bytes),
        cur.block_write_bytes.checked_sub(prev.block_write_bytes),
    );
    let (Some(cpu_delta), Some(rx_delta), Some(tx_delta), Some(read_delta), Some(write_delta)) =
        deltas
    else {
        return Normalized::CounterReset;
    };

    let wall_ns = (cur.timestamp_ns - prev.timestamp_ns) as f64;
    let wall_secs = wall_ns / NANOS_PER_SEC;
    let cpus = cur.online_cpus.max(1) as f64;
    let max_cpu = 100.0 * cpus;
    let cpu_share = |delta: u64| ((delta as f64 / wall_ns) * 100.0 * cpus).clamp(0.0, max_cpu);
    // Auxiliary counters never force a new baseline; a decrease just contributes nothing.
    let aux = |now: u64, before: u64| now.saturating_sub(before);

    let memory_percent = if cur.memory_limit_bytes > 0 {
        (cur.memory_usage_bytes as f64 / cur.memory_limit_bytes as f64) * 100.0
    } else {
        0.0
    };

    Normalized::Rate(RateSample {
        id: cur.id.clone(),
        timestamp_ns: cur.timestamp_ns,
        cpu_percent: cpu_share(cpu_delta),
        cpu_kernel_percent: cpu_share(aux(cur.cpu_kernel_ns, prev.cpu_kernel_ns)),
        cpu_user_percent: cpu_share(aux(cur.cpu_user_ns, prev.cpu_user_ns)),
        cpu_throttled_periods_per_sec: per_sec(
            aux(cur.cpu_throttled_periods, prev.cpu_throttled_periods),
            wall_secs,
        ),
        cpu_throttled_percent: aux(cur.cpu_throttled_time_ns, prev.cpu_throttled_time_ns) as f64
            / wall_ns
            * 100.0,
        memory_usage_bytes: cur.memory_usage_bytes,
        memory_limit_bytes: cur.memory_limit_bytes,
        memory_percent,
        memory_cache_bytes: cur.memory_cache_bytes,
        memory_swap_bytes: cur.memory_swap_bytes,
        oom_kills: cur.oom_kills,
        network_rx_bytes_per_sec: per_sec(rx_delta, wall_secs),
        network_tx_bytes_per_sec: per_sec(tx_delta, wall_secs),
        network_rx_errors_per_sec: per_sec(
            aux(cur.network_rx_errors, prev.network_rx_errors),
            wall_secs,
        ),
        network_tx_errors_per_sec: per_sec(
            aux(cur.network_tx_errors, prev.network_tx_errors),
            wall_secs,
        ),
        network_rx_dropped_per_sec: per_sec(
            aux(cur.network_rx_dropped, prev.network_rx_dropped),
            wall_secs,
        ),
        network_tx_dropped_per_sec: per_sec(
            aux(cur.network_tx_dropped, prev.network_tx_dropped),
            wall_secs,
        ),
        block_read_bytes_per_sec: per_sec(read_delta, wall_secs),
        block_write_bytes_per_sec: per_sec(write_delta, wall_secs),
        pids: cur.pids,
    })
}

fn per_sec(delta: u64, wall_secs: f64) -> f64 {
    (delta as f64 / wall_secs).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: u64 = 1_000_000_000;

    fn raw(ts: u64, cpu_ns: u64, cpus: u32) -> RawSample {
        RawSample {
            cpu_total_ns: cpu_ns,
            online_cpus: cpus,
            ..RawSample::zeroed("c1", ts)
        }
    }

    #[test]
    fn first_sample_only_sets_baseline() {
        assert_eq!(normalize(None, &raw(0, 0, 1)), Normalized::Baseline);
    }

    #[test]
    fn cpu_percent_scales_with_online_cpus() {
        let prev = raw(0, 1_000_000_000, 4);
        let cur = raw(2 * SEC, 1_200_000_000, 4);
        let rate = normalize(Some(&prev), &cur);
        let rate = rate.rate().unwrap();
        assert!((rate.cpu_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_percent_is_clamped_to_cpu_count() {
        let prev = raw(0, 0, 2);
        let cur = raw(SEC, 5 * SEC, 2);
        let out = normalize(Some(&prev), &cur);
        assert_eq!(out.rate().unwrap().cpu_percent, 200.0);
    }

    #[test]
    fn identical_timestamps_produce_no_rate_and_keep_baseline() {
        let prev = raw(SEC, 0, 1);
        let cur = raw(SEC, 10, 1);
        let out = normalize(Some(&prev), &cur);
        assert_eq!(out, Normalized::NonIncreasingTime);
        assert!(!out.advances_baseline());
    }

    #[test]
    fn decreasing_counter_is_a_reset() {
        let prev = RawSample {
            network_rx_bytes: 5000,
            ..raw(0, 0, 1)
        };
        let cur = RawSample {
            network_rx_bytes: 2000,
            ..raw(SEC, 0, 1)
        };
        let out = normalize(Some(&prev), &cur);
        assert_eq!(out, Normalized::CounterReset);
        assert!(out.advances_baseline());

        let next = RawSample {
            network_rx_bytes: 3000,
            ..raw(2 * SEC, 0, 1)
        };
        let rate = normalize(Some(&cur), &next);
        assert_eq!(rate.rate().unwrap().network_rx_bytes_per_sec, 1000.0);
    }

    #[test]
    fn byte_rates_and_memory() {
        let prev = RawSample {
            network_tx_bytes: 1000,
            block_read_bytes: 0,
            block_write_bytes: 4096,
            ..raw(0, 0, 1)
        };
        let cur = RawSample {
            network_tx_bytes: 3000,
            block_read_bytes: 8192,
            block_write_bytes: 8192,
            memory_usage_bytes: 256,
            memory_limit_bytes: 1024,
            pids: 7,
            ..raw(2 * SEC, 0, 1)
        };
        let out = normalize(Some(&prev), &cur);
        let rate = out.rate().unwrap();
        assert_eq!(rate.network_tx_bytes_per_sec, 1000.0);
        assert_eq!(rate.block_read_bytes_per_sec, 4096.0);
        assert_eq!(rate.block_write_bytes_per_sec, 2048.0);
        assert_eq!(rate.block_bytes_per_sec(), 6144.0);
        assert_eq!(rate.memory_usage_bytes, 256);
        assert_eq!(rate.memory_percent, 25.0);
        assert_eq!(rate.pids, 7);
        assert_eq!(rate.timestamp_ns, 2 * SEC);
    }

    #[test]
    fn cpu_split_throttling_and_network_errors() {
        let prev = RawSample {
            cpu_kernel_ns: SEC / 10,
            cpu_user_ns: SEC,
            cpu_throttled_periods: 10,
            cpu_throttled_time_ns: 0,
            network_rx_errors: 2,
            network_tx_dropped: 8,
            ..raw(0, 0, 2)
        };
        let cur = RawSample {
            cpu_kernel_ns: SEC / 10 + SEC / 5,
            cpu_user_ns: SEC + SEC / 2,
            cpu_throttled_periods: 30,
            cpu_throttled_time_ns: SEC / 2,
            network_rx_errors: 6,
            network_tx_dropped: 8,
            memory_cache_bytes: 4096,
            memory_swap_bytes: 1024,
            oom_kills: 1,
            ..raw(2 * SEC, SEC, 2)
        };
        let out = normalize(Some(&prev), &cur);
        let rate = out.rate().unwrap();
        assert!((rate.cpu_percent - 100.0).abs() < 1e-9);
        assert!((rate.cpu_kernel_percent - 20.0).abs() < 1e-9);
        assert!((rate.cpu_user_percent - 50.0).abs() < 1e-9);
        assert_eq!(rate.cpu_throttled_periods_per_sec, 10.0);
        assert!((rate.cpu_throttled_percent - 25.0).abs() < 1e-9);
        assert_eq!(rate.network_rx_errors_per_sec, 2.0);
        assert_eq!(rate.network_tx_dropped_per_sec, 0.0);
        assert_eq!(rate.memory_cache_bytes, 4096);
        assert_eq!(rate.memory_swap_bytes, 1024);
        assert_eq!(rate.oom_kills, 1);
    }

    #[test]
    fn decreasing_auxiliary_counter_still_yields_a_rate() {
        let prev = RawSample {
            cpu_throttled_periods: 50,
            network_tx_errors: 9,
            ..raw(0, 0, 1)
        };
        let cur = raw(SEC, SEC / 2, 1);
        let out = normalize(Some(&prev), &cur);
        let rate = out.rate().unwrap();
        assert_eq!(rate.cpu_percent, 50.0);
        assert_eq!(rate.cpu_throttled_periods_per_sec, 0.0);
        assert_eq!(rate.network_tx_errors_per_sec, 0.0);
    }

    #[test]
    fn samples_from_different_containers_never_form_a_rate() {
        let prev = raw(0, 0, 1);
        let cur = RawSample {
            cpu_total_ns: SEC,
            ..RawSample::zeroed("other", SEC)
        };
        assert_eq!(normalize(Some(&prev), &cur), Normalized::Baseline);
    }
}
