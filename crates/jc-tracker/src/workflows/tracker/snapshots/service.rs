use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::super::domain::TaskRecord;
use super::diff::{compare, SnapshotComparison};
use super::domain::{Snapshot, SnapshotId};
use super::repository::{SnapshotError, SnapshotRepository};

/// Source of capture timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Creates, lists and compares snapshots held in a repository.
pub struct SnapshotService<R, C = SystemClock> {
    repository: Arc<R>,
    clock: C,
}

impl<R> SnapshotService<R, SystemClock>
where
    R: SnapshotRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_clock(repository, SystemClock)
    }
}

impl<R, C> SnapshotService<R, C>
where
    R: SnapshotRepository,
    C: Clock,
{
    pub fn with_clock(repository: Arc<R>, clock: C) -> Self {
        Self { repository, clock }
    }

    /// Captures `records` under an id derived from the current minute.
    ///
    /// A second capture within the same minute replaces the first.
    pub fn create(
        &self,
        records: Vec<TaskRecord>,
        description: Option<String>,
    ) -> Result<SnapshotId, SnapshotError> {
        let snapshot = Snapshot::capture(self.clock.now(), description, records);
        let id = snapshot.id.clone();
        let total_tasks = snapshot.metrics.total_tasks;

        if self.repository.store(snapshot)?.is_some() {
            warn!(snapshot = %id, "replaced snapshot captured in the same minute");
        }
        info!(snapshot = %id, total_tasks, "snapshot captured");
        Ok(id)
    }

    pub fn get(&self, id: &SnapshotId) -> Result<Option<Arc<Snapshot>>, SnapshotError> {
        self.repository.fetch(id)
    }

    pub fn list_ids(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        self.repository.ids()
    }

    /// Compares two stored snapshots. Either id missing yields
    /// `ComparisonUnavailable` naming every missing id.
    pub fn compare(
        &self,
        before: &SnapshotId,
        after: &SnapshotId,
    ) -> Result<SnapshotComparison, SnapshotServiceError> {
        let earlier = self.repository.fetch(before)?;
        let later = self.repository.fetch(after)?;

        match (earlier, later) {
            (Some(earlier), Some(later)) => Ok(compare(&earlier, &later)),
            (earlier, later) => {
                let mut missing = Vec::new();
                if earlier.is_none() {
                    missing.push(before.clone());
                }
                if later.is_none() && (before != after || earlier.is_some()) {
                    missing.push(after.clone());
                }
                Err(ComparisonUnavailable { missing }.into())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("snapshot comparison unavailable, missing {}", join_ids(.missing))]
pub struct ComparisonUnavailable {
    pub missing: Vec<SnapshotId>,
}

fn join_ids(ids: &[SnapshotId]) -> String {
    ids.iter()
        .map(SnapshotId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotServiceError {
    #[error(transparent)]
    Repository(#[from] SnapshotError),
    #[error(transparent)]
    Unavailable(#[from] ComparisonUnavailable),
}
