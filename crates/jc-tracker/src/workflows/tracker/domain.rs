use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Quarter key such as `2025_Q3`; one source document per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(pub String);

impl PeriodKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task lifecycle state. Labels outside the known set are preserved as
/// `Unknown` so they still form their own column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Complete,
    Published,
    Merged,
    InProgress,
    Blocked,
    Unknown(String),
}

impl TaskStatus {
    pub const KNOWN: [TaskStatus; 5] = [
        Self::Complete,
        Self::Published,
        Self::Merged,
        Self::InProgress,
        Self::Blocked,
    ];

    /// Statuses that count as done for completion rates.
    pub const COMPLETION_BUCKET: [TaskStatus; 3] = [Self::Complete, Self::Merged, Self::Published];

    pub fn parse(raw: &str) -> Self {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::KNOWN
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(&collapsed))
            .unwrap_or(Self::Unknown(collapsed))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Complete => "Complete",
            Self::Published => "Published",
            Self::Merged => "Merged",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::Unknown(label) => label,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Complete | Self::Merged | Self::Published)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    fn sort_rank(&self) -> usize {
        match self {
            Self::Complete => 0,
            Self::Published => 1,
            Self::Merged => 2,
            Self::InProgress => 3,
            Self::Blocked => 4,
            Self::Unknown(_) => 5,
        }
    }
}

impl Ord for TaskStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_rank()
            .cmp(&other.sort_rank())
            .then_with(|| self.label().cmp(other.label()))
    }
}

impl PartialOrd for TaskStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        match value {
            TaskStatus::Unknown(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// One station's status within one weekly table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub period: PeriodKey,
    pub week: String,
    pub station: String,
    pub status: TaskStatus,
    pub delivery_window: String,
    pub business_type: String,
    pub chain: String,
    pub owner: String,
    pub category: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub captured_at: DateTime<Local>,
}

/// Distinct specialists, sorted, for owner selection.
pub fn owners(records: &[TaskRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.owner.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keeps records owned by one of `selected`; an empty selection keeps everything.
pub fn retain_owners(records: Vec<TaskRecord>, selected: &[String]) -> Vec<TaskRecord> {
    if selected.is_empty() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| selected.iter().any(|owner| owner == &record.owner))
        .collect()
}
