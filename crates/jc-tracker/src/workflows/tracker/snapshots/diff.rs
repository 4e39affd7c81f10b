use super::super::domain::TaskStatus;
use super::super::report::{AggregateView, GroupKey, StatusVocabulary};
use super::domain::{Snapshot, SnapshotId, SnapshotMetrics};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Add;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountDelta {
    pub before: usize,
    pub after: usize,
    pub diff: i64,
}

impl CountDelta {
    pub fn new(before: usize, after: usize) -> Self {
        Self {
            before,
            after,
            diff: after as i64 - before as i64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before == 0 && self.after == 0
    }
}

impl Add for CountDelta {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.before + other.before, self.after + other.after)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotHeader {
    pub id: SnapshotId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Local>,
}

impl SnapshotHeader {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            description: snapshot.description.clone(),
            created_at: snapshot.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub status: TaskStatus,
    #[serde(flatten)]
    pub change: CountDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerStatusChange {
    pub owner: String,
    pub status: TaskStatus,
    #[serde(flatten)]
    pub change: CountDelta,
}

/// Per-specialist roll-up of the owner/status deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerChangeSummary {
    pub owner: String,
    pub total: CountDelta,
    pub completed: CountDelta,
    pub in_progress_or_blocked: CountDelta,
    /// Only statuses present on at least one side.
    pub statuses: Vec<StatusChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotComparison {
    pub before: SnapshotHeader,
    pub after: SnapshotHeader,
    pub total_tasks_diff: i64,
    pub completed: CountDelta,
    pub status_changes: Vec<StatusChange>,
    pub owner_status_changes: Vec<OwnerStatusChange>,
    pub owners: Vec<OwnerChangeSummary>,
    /// Owner × status counts of the later snapshot, its owners only.
    pub current: AggregateView,
}

impl SnapshotComparison {
    pub fn status_change(&self, status: &TaskStatus) -> Option<&CountDelta> {
        self.status_changes
            .iter()
            .find(|entry| &entry.status == status)
            .map(|entry| &entry.change)
    }

    pub fn owner_status_change(&self, owner: &str, status: &TaskStatus) -> Option<&CountDelta> {
        self.owner_status_changes
            .iter()
            .find(|entry| entry.owner == owner && &entry.status == status)
            .map(|entry| &entry.change)
    }
}

/// Compares two snapshots over the union of their statuses and owners.
/// Counts missing on one side are zero.
pub fn compare(before: &Snapshot, after: &Snapshot) -> SnapshotComparison {
    let (old, new) = (&before.metrics, &after.metrics);

    let statuses: BTreeSet<&TaskStatus> = old
        .status_counts
        .keys()
        .chain(new.status_counts.keys())
        .collect();
    let owners: BTreeSet<&str> = old
        .owner_status_counts
        .keys()
        .chain(new.owner_status_counts.keys())
        .map(String::as_str)
        .collect();

    let status_changes: Vec<StatusChange> = statuses
        .iter()
        .map(|status| StatusChange {
            status: (*status).clone(),
            change: CountDelta::new(old.status_count(status), new.status_count(status)),
        })
        .collect();

    let completed = status_changes
        .iter()
        .filter(|entry| entry.status.is_completed())
        .fold(CountDelta::default(), |sum, entry| sum + entry.change);

    let mut owner_status_changes = Vec::with_capacity(owners.len() * statuses.len());
    let mut owner_summaries = Vec::with_capacity(owners.len());
    for owner in &owners {
        let changes: Vec<StatusChange> = statuses
            .iter()
            .map(|status| StatusChange {
                status: (*status).clone(),
                change: CountDelta::new(
                    old.owner_status_count(owner, status),
                    new.owner_status_count(owner, status),
                ),
            })
            .collect();

        owner_summaries.push(summarize_owner(owner, &changes));
        owner_status_changes.extend(changes.into_iter().map(|entry| OwnerStatusChange {
            owner: (*owner).to_string(),
            status: entry.status,
            change: entry.change,
        }));
    }

    let vocabulary = StatusVocabulary::from_statuses(statuses.iter().map(|s| (*s).clone()));
    let current = current_numbers(new, vocabulary);

    SnapshotComparison {
        before: SnapshotHeader::of(before),
        after: SnapshotHeader::of(after),
        total_tasks_diff: new.total_tasks as i64 - old.total_tasks as i64,
        completed,
        status_changes,
        owner_status_changes,
        owners: owner_summaries,
        current,
    }
}

fn summarize_owner(owner: &str, changes: &[StatusChange]) -> OwnerChangeSummary {
    let sum_where = |keep: fn(&TaskStatus) -> bool| {
        changes
            .iter()
            .filter(|entry| keep(&entry.status))
            .fold(CountDelta::default(), |sum, entry| sum + entry.change)
    };

    OwnerChangeSummary {
        owner: owner.to_string(),
        total: sum_where(|_| true),
        completed: sum_where(TaskStatus::is_completed),
        in_progress_or_blocked: sum_where(|status| {
            matches!(status, TaskStatus::InProgress | TaskStatus::Blocked)
        }),
        statuses: changes
            .iter()
            .filter(|entry| !entry.change.is_empty())
            .cloned()
            .collect(),
    }
}

fn current_numbers(metrics: &SnapshotMetrics, vocabulary: StatusVocabulary) -> AggregateView {
    let rows: Vec<(Vec<String>, Vec<usize>)> = metrics
        .owner_status_counts
        .keys()
        .map(|owner| {
            let counts = vocabulary
                .statuses()
                .iter()
                .map(|status| metrics.owner_status_count(owner, status))
                .collect();
            (vec![owner.clone()], counts)
        })
        .collect();

    AggregateView::from_counts(GroupKey::Owner.dimensions(), vocabulary, rows)
}
