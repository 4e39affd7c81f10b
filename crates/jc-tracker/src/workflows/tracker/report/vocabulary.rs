use super::super::domain::{TaskRecord, TaskStatus};
use serde::Serialize;
use std::collections::BTreeSet;

/// Canonical status columns for one comparison scope.
///
/// Every view built from the same vocabulary carries the same columns in the
/// same order, zero-filled where a slice has no records for a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusVocabulary(Vec<TaskStatus>);

impl StatusVocabulary {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = TaskStatus>,
    {
        let unique: BTreeSet<TaskStatus> = statuses.into_iter().collect();
        Self(unique.into_iter().collect())
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskRecord>,
    {
        Self::from_statuses(records.into_iter().map(|record| record.status.clone()))
    }

    /// Vocabulary that always carries the known statuses, plus whatever else
    /// the records contain.
    pub fn with_known<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskRecord>,
    {
        Self::from_records(records).union(&Self::from_statuses(TaskStatus::KNOWN))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_statuses(self.0.iter().chain(other.0.iter()).cloned())
    }

    pub fn statuses(&self) -> &[TaskStatus] {
        &self.0
    }

    pub fn position(&self, status: &TaskStatus) -> Option<usize> {
        self.0.binary_search(status).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(TaskStatus::label)
    }
}
