use super::super::domain::{TaskRecord, TaskStatus};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot ids are minute-granularity local timestamps.
pub const SNAPSHOT_ID_FORMAT: &str = "%Y%m%d_%H%M";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    pub fn from_timestamp(at: DateTime<Local>) -> Self {
        Self(at.format(SNAPSHOT_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counts computed once when a snapshot is captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotMetrics {
    pub total_tasks: usize,
    pub status_counts: BTreeMap<TaskStatus, usize>,
    pub owner_status_counts: BTreeMap<String, BTreeMap<TaskStatus, usize>>,
}

impl SnapshotMetrics {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let mut metrics = Self {
            total_tasks: records.len(),
            ..Self::default()
        };

        for record in records {
            *metrics
                .status_counts
                .entry(record.status.clone())
                .or_default() += 1;
            *metrics
                .owner_status_counts
                .entry(record.owner.clone())
                .or_default()
                .entry(record.status.clone())
                .or_default() += 1;
        }

        metrics
    }

    pub fn status_count(&self, status: &TaskStatus) -> usize {
        self.status_counts.get(status).copied().unwrap_or(0)
    }

    pub fn owner_status_count(&self, owner: &str, status: &TaskStatus) -> usize {
        self.owner_status_counts
            .get(owner)
            .and_then(|counts| counts.get(status))
            .copied()
            .unwrap_or(0)
    }
}

/// Immutable capture of a record set. Shared out of the repository as
/// `Arc<Snapshot>`, so nothing can mutate it after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub description: Option<String>,
    pub created_at: DateTime<Local>,
    pub records: Vec<TaskRecord>,
    pub metrics: SnapshotMetrics,
}

impl Snapshot {
    pub fn capture(
        created_at: DateTime<Local>,
        description: Option<String>,
        records: Vec<TaskRecord>,
    ) -> Self {
        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let metrics = SnapshotMetrics::from_records(&records);

        Self {
            id: SnapshotId::from_timestamp(created_at),
            description,
            created_at,
            records,
            metrics,
        }
    }
}
