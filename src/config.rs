use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Margin subtracted from the poll interval to get the default per-container sample timeout.
const SAMPLE_TIMEOUT_MARGIN: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Sampling engine settings. All fields have defaults so an empty `[engine]` table is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick cadence for reconcile + sample.
    pub poll_interval_secs: f64,
    /// History ring capacity (K) per container.
    pub history_capacity: usize,
    /// Consecutive absent reconciliations before a record is removed.
    pub retire_grace_ticks: u32,
    /// Upper bound on concurrent per-container stats requests within a tick.
    pub max_concurrent_samples: usize,
    /// Consecutive NotFound/Timeout failures before a record is retired early.
    pub failure_retire_threshold: u32,
    /// Per-container request budget. Defaults to the poll interval minus a small margin.
    pub sample_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2.0,
            history_capacity: 60,
            retire_grace_ticks: 3,
            max_concurrent_samples: 16,
            failure_retire_threshold: 3,
            sample_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    /// Effective per-container timeout (explicit, or interval minus margin, floored at half the interval).
    pub fn sample_timeout(&self) -> Duration {
        match self.sample_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => {
                let interval = self.poll_interval();
                interval
                    .saturating_sub(SAMPLE_TIMEOUT_MARGIN)
                    .max(interval / 2)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.poll_interval_secs.is_finite() || self.poll_interval_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "engine.poll_interval_secs",
                format!("must be a finite number > 0, got {}", self.poll_interval_secs),
            ));
        }
        ensure_positive("engine.history_capacity", self.history_capacity as u64)?;
        ensure_positive("engine.retire_grace_ticks", self.retire_grace_ticks as u64)?;
        ensure_positive(
            "engine.max_concurrent_samples",
            self.max_concurrent_samples as u64,
        )?;
        ensure_positive(
            "engine.failure_retire_threshold",
            self.failure_retire_threshold as u64,
        )?;
        if let Some(ms) = self.sample_timeout_ms {
            ensure_positive("engine.sample_timeout_ms", ms)?;
            if Duration::from_millis(ms) > self.poll_interval() {
                return Err(ConfigError::invalid(
                    "engine.sample_timeout_ms",
                    format!(
                        "must not exceed the poll interval ({} ms), got {}",
                        self.poll_interval().as_millis(),
                        ms
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Unix socket path; bollard's defaults (DOCKER_HOST or /var/run/docker.sock) when unset.
    pub socket: Option<String>,
    pub timeout_secs: u64,
    /// Budget for each container inspect while listing. Defaults to half the sample timeout.
    pub inspect_timeout_ms: Option<u64>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            timeout_secs: 120,
            inspect_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often the binary logs a containers summary at INFO level.
    pub summary_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            summary_log_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Loads `$CONFIG_FILE` (must exist), else `./config.toml` if present, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(Path::new(&path)),
            Err(_) => {
                let path = Path::new("config.toml");
                if path.exists() {
                    Self::load_from_path(path)
                } else {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        Self::load_from_str(&s)
    }

    /// Per-container inspect budget while listing. Stays below the list call's budget.
    pub fn inspect_timeout(&self) -> Duration {
        match self.docker.inspect_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.engine.sample_timeout() / 2,
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if let Some(socket) = &self.docker.socket
            && socket.is_empty()
        {
            return Err(ConfigError::invalid(
                "docker.socket",
                "must be non-empty when set",
            ));
        }
        ensure_positive("docker.timeout_secs", self.docker.timeout_secs)?;
        if let Some(ms) = self.docker.inspect_timeout_ms {
            ensure_positive("docker.inspect_timeout_ms", ms)?;
            let list_budget = self.engine.sample_timeout();
            if Duration::from_millis(ms) >= list_budget {
                return Err(ConfigError::invalid(
                    "docker.inspect_timeout_ms",
                    format!(
                        "must be below the sample timeout ({} ms), got {}",
                        list_budget.as_millis(),
                        ms
                    ),
                ));
            }
        }
        ensure_positive(
            "monitoring.summary_log_interval_secs",
            self.monitoring.summary_log_interval_secs,
        )?;
        Ok(())
    }
}

fn ensure_positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be > 0, got 0"));
    }
    Ok(())
}
