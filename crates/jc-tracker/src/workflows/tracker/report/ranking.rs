use super::super::domain::{TaskRecord, TaskStatus};
use super::aggregate::{completion_rate, StatusCount};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const RANKING_COLUMNS: [&str; 10] = [
    "Rank",
    "Specialist",
    "Total Tasks",
    "Completed+Published+Merged",
    "Completed",
    "Published",
    "Merged",
    "In Progress",
    "Blocked",
    "Completion Rate (%)",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub specialist: String,
    pub total_tasks: usize,
    pub completed_bucket: usize,
    pub complete: usize,
    pub published: usize,
    pub merged: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub completion_rate: f64,
    pub breakdown: Vec<StatusCount>,
}

impl RankingRow {
    /// Cells in `RANKING_COLUMNS` order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.rank.to_string(),
            self.specialist.clone(),
            self.total_tasks.to_string(),
            self.completed_bucket.to_string(),
            self.complete.to_string(),
            self.published.to_string(),
            self.merged.to_string(),
            self.in_progress.to_string(),
            self.blocked.to_string(),
            format!("{:.1}", self.completion_rate),
        ]
    }
}

/// Ranks specialists by total tasks, descending.
///
/// Specialists are grouped in order of first appearance and the sort is
/// stable, so equal totals keep that order.
pub fn rank_specialists(records: &[TaskRecord]) -> Vec<RankingRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, BTreeMap<&TaskStatus, usize>)> = Vec::new();

    for record in records {
        let slot = *index.entry(record.owner.as_str()).or_insert_with(|| {
            groups.push((record.owner.as_str(), BTreeMap::new()));
            groups.len() - 1
        });
        *groups[slot].1.entry(&record.status).or_default() += 1;
    }

    let mut rows: Vec<RankingRow> = groups
        .into_iter()
        .map(|(specialist, counts)| build_row(specialist, &counts))
        .collect();
    rows.sort_by(|a, b| b.total_tasks.cmp(&a.total_tasks));

    for (position, row) in rows.iter_mut().enumerate() {
        row.rank = position + 1;
    }
    rows
}

fn build_row(specialist: &str, counts: &BTreeMap<&TaskStatus, usize>) -> RankingRow {
    let count = |status: &TaskStatus| counts.get(status).copied().unwrap_or(0);
    let total_tasks = counts.values().sum();
    let completed_bucket = TaskStatus::COMPLETION_BUCKET.iter().map(count).sum();

    RankingRow {
        rank: 0,
        specialist: specialist.to_string(),
        total_tasks,
        completed_bucket,
        complete: count(&TaskStatus::Complete),
        published: count(&TaskStatus::Published),
        merged: count(&TaskStatus::Merged),
        in_progress: count(&TaskStatus::InProgress),
        blocked: count(&TaskStatus::Blocked),
        completion_rate: completion_rate(completed_bucket, total_tasks),
        breakdown: counts
            .iter()
            .map(|(status, count)| StatusCount {
                status: (*status).clone(),
                count: *count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tracker::domain::PeriodKey;
    use chrono::Local;

    fn record(owner: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            period: PeriodKey::new("2025_Q4"),
            week: "WK40".to_string(),
            station: format!("{owner}-station"),
            status,
            delivery_window: String::new(),
            business_type: String::new(),
            chain: String::new(),
            owner: owner.to_string(),
            category: String::new(),
            task_type: String::new(),
            captured_at: Local::now(),
        }
    }

    #[test]
    fn single_specialist_scenario() {
        let records = vec![
            record("Alice", TaskStatus::Complete),
            record("Alice", TaskStatus::Blocked),
        ];

        let rows = rank_specialists(&records);
        assert_eq!(rows.len(), 1);
        let alice = &rows[0];
        assert_eq!(alice.rank, 1);
        assert_eq!(alice.specialist, "Alice");
        assert_eq!(alice.total_tasks, 2);
        assert_eq!(alice.completed_bucket, 1);
        assert_eq!(alice.completion_rate, 50.0);
        assert_eq!(alice.cells()[9], "50.0");
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let records = vec![
            record("Zoe", TaskStatus::InProgress),
            record("Adam", TaskStatus::Merged),
            record("Mia", TaskStatus::Published),
            record("Mia", TaskStatus::Complete),
        ];

        let rows = rank_specialists(&records);
        let order: Vec<_> = rows.iter().map(|row| row.specialist.as_str()).collect();
        assert_eq!(order, ["Mia", "Zoe", "Adam"]);
        let ranks: Vec<_> = rows.iter().map(|row| row.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert!(rows.windows(2).all(|pair| pair[0].total_tasks >= pair[1].total_tasks));
        assert_eq!(rows[0].completion_rate, 100.0);
        assert_eq!(rows[1].completion_rate, 0.0);
    }

    #[test]
    fn unknown_statuses_count_toward_total_only() {
        let records = vec![
            record("Raj", TaskStatus::Unknown("Deferred".to_string())),
            record("Raj", TaskStatus::Merged),
            record("Raj", TaskStatus::Merged),
        ];

        let rows = rank_specialists(&records);
        assert_eq!(rows[0].total_tasks, 3);
        assert_eq!(rows[0].merged, 2);
        assert_eq!(rows[0].completion_rate, 66.7);
        assert_eq!(rows[0].breakdown.len(), 2);
    }

    #[test]
    fn empty_slice_yields_no_rows() {
        assert!(rank_specialists(&[]).is_empty());
    }
}
