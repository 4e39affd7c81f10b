//! Point-in-time captures of a record set and their comparison.

mod diff;
mod domain;
mod repository;
mod service;

pub use diff::{
    compare, CountDelta, OwnerChangeSummary, OwnerStatusChange, SnapshotComparison,
    SnapshotHeader, StatusChange,
};
pub use domain::{Snapshot, SnapshotId, SnapshotMetrics, SNAPSHOT_ID_FORMAT};
pub use repository::{InMemorySnapshotRepository, SnapshotError, SnapshotRepository};
pub use service::{
    Clock, ComparisonUnavailable, SnapshotService, SnapshotServiceError, SystemClock,
};
