use anyhow::Result;
use container_pulse::humanize::{format_bytes, format_rate, format_uptime};
use container_pulse::models::Snapshot;
use container_pulse::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!("{} - {}", version::banner(), version::DESCRIPTION);

    let docker_repo = docker_repo::DockerRepo::connect(&app_config.docker)?
        .with_inspect_timeout(app_config.inspect_timeout());
    if let Err(e) = docker_repo.ping().await {
        tracing::warn!(error = %e, "Docker ping failed; will keep retrying every tick");
    }

    let engine = Engine::start(app_config.engine.clone(), Arc::new(docker_repo))?;

    let mut summary_tick = tokio::time::interval(tokio::time::Duration::from_secs(
        app_config.monitoring.summary_log_interval_secs,
    ));
    summary_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately, before any data exists.
    summary_tick.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = summary_tick.tick() => log_summary(&engine.get_snapshot()),
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }
    engine.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn log_summary(snapshot: &Snapshot) {
    let summary = snapshot.summary();
    tracing::info!(
        tick = snapshot.tick,
        containers = summary.containers,
        with_data = summary.containers_with_data,
        total_cpu_percent = %format!("{:.2}", summary.total_cpu_percent),
        total_memory = %format_bytes(summary.total_memory_bytes),
        net_rx = %format_rate(summary.total_network_rx_bytes_per_sec),
        net_tx = %format_rate(summary.total_network_tx_bytes_per_sec),
        block_io = %format_rate(summary.total_block_bytes_per_sec),
        stale = snapshot.is_stale(),
        "containers summary"
    );
    if let Some(daemon) = &snapshot.daemon {
        tracing::info!(
            version = %daemon.server_version,
            os = %daemon.operating_system,
            cpus = daemon.cpu_count,
            memory = %format_bytes(daemon.memory_total_bytes),
            running = daemon.containers_running,
            paused = daemon.containers_paused,
            stopped = daemon.containers_stopped,
            images = daemon.images,
            "docker daemon"
        );
    }
    let now_ms = snapshot.taken_at_ms as i64;
    for c in &snapshot.containers {
        let uptime = c
            .info
            .started_at
            .map(|started| format_uptime((now_ms.saturating_sub(started).max(0) / 1000) as u64))
            .unwrap_or_else(|| "N/A".to_string());
        match &c.latest {
            Some(latest) => tracing::info!(
                container = %c.info.name,
                image = %c.info.image,
                uptime = %uptime,
                health = c.info.health.as_deref().unwrap_or("N/A"),
                cpu_percent = %format!("{:.2}", latest.cpu_percent),
                memory = %format_bytes(latest.memory_usage_bytes),
                memory_percent = %format!("{:.1}", latest.memory_percent),
                swap = %format_bytes(latest.memory_swap_bytes),
                throttled_percent = %format!("{:.1}", latest.cpu_throttled_percent),
                oom_kills = latest.oom_kills,
                net_rx = %format_rate(latest.network_rx_bytes_per_sec),
                net_tx = %format_rate(latest.network_tx_bytes_per_sec),
                block_io = %format_rate(latest.block_bytes_per_sec()),
                pids = latest.pids,
                "container"
            ),
            None => tracing::info!(
                container = %c.info.name,
                image = %c.info.image,
                uptime = %uptime,
                "container (no data yet)"
            ),
        }
    }
}
