// Domain models: container identity, raw and normalized samples, published snapshots

mod container;
mod daemon;
mod sample;
mod snapshot;

pub use container::{ContainerId, ContainerInfo, LifecycleState, RetireReason};
pub use daemon::DaemonInfo;
pub use sample::{RateSample, RawSample};
pub use snapshot::{ContainerSnapshot, Snapshot, SnapshotSummary};
