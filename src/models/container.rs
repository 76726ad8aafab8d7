// Container identity and lifecycle models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque runtime identifier, stable for one container instance and never reused.
/// Cheap to clone: every sample and snapshot entry carries one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(Arc<str>);

impl ContainerId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, as `docker ps` shows them.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// One entry of the runtime's running-container list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    /// Start time (unix ms). Unknown when the runtime could not be inspected.
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub restart_count: u64,
    /// Healthcheck status (e.g. "healthy"), when the container defines one.
    #[serde(default)]
    pub health: Option<String>,
}

impl ContainerInfo {
    pub fn new(id: impl Into<ContainerId>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            started_at: None,
            restart_count: 0,
            health: None,
        }
    }

    /// Whether `other` describes a different instance than `self` (start time changed).
    /// Unknown start times never count as a restart.
    pub fn restarted_as(&self, other: &ContainerInfo) -> bool {
        match (self.started_at, other.started_at) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetireReason {
    /// Missing from the runtime's live list.
    Absent,
    /// Repeated per-container stats failures (NotFound / Timeout).
    SampleFailures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum LifecycleState {
    Tracked,
    Retiring(RetireReason),
}

impl LifecycleState {
    pub fn is_tracked(&self) -> bool {
        matches!(self, LifecycleState::Tracked)
    }
}
