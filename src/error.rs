// Error taxonomy: per-container / daemon errors from the stats source, fatal config errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by a [`crate::source::StatsSource`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Runtime unreachable or returned something unusable. Retried next tick.
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    /// Container no longer exists (stats or inspect returned 404).
    #[error("container {0} not found")]
    NotFound(String),

    /// Request exceeded its time budget.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

impl SourceError {
    /// Whether this failure counts toward fast-path retirement of a container.
    /// Daemon-level unavailability does not: it says nothing about the container itself.
    pub fn counts_toward_retirement(&self) -> bool {
        matches!(self, SourceError::NotFound(_) | SourceError::Timeout(_))
    }
}

/// Invalid or unreadable configuration. Fatal at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
