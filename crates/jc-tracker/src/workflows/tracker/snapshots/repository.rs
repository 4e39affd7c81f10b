use super::domain::{Snapshot, SnapshotId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Storage abstraction so sessions and tests each own their snapshots.
pub trait SnapshotRepository: Send + Sync {
    /// Stores `snapshot`, returning the snapshot it replaced under the same id.
    fn store(&self, snapshot: Snapshot) -> Result<Option<Arc<Snapshot>>, SnapshotError>;
    fn fetch(&self, id: &SnapshotId) -> Result<Option<Arc<Snapshot>>, SnapshotError>;
    /// Ids in first-insertion order.
    fn ids(&self) -> Result<Vec<SnapshotId>, SnapshotError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct SnapshotIndex {
    order: Vec<SnapshotId>,
    by_id: HashMap<SnapshotId, Arc<Snapshot>>,
}

/// Process-lifetime store. One mutex makes every call atomic.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    inner: Mutex<SnapshotIndex>,
}

impl InMemorySnapshotRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SnapshotIndex>, SnapshotError> {
        self.inner
            .lock()
            .map_err(|_| SnapshotError::Unavailable("snapshot mutex poisoned".to_string()))
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn store(&self, snapshot: Snapshot) -> Result<Option<Arc<Snapshot>>, SnapshotError> {
        let mut guard = self.lock()?;
        let id = snapshot.id.clone();
        let replaced = guard.by_id.insert(id.clone(), Arc::new(snapshot));
        if replaced.is_none() {
            guard.order.push(id);
        }
        Ok(replaced)
    }

    fn fetch(&self, id: &SnapshotId) -> Result<Option<Arc<Snapshot>>, SnapshotError> {
        let guard = self.lock()?;
        Ok(guard.by_id.get(id).cloned())
    }

    fn ids(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        let guard = self.lock()?;
        Ok(guard.order.clone())
    }
}
