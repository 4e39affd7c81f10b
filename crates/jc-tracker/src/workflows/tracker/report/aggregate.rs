use super::super::domain::{TaskRecord, TaskStatus};
use super::vocabulary::StatusVocabulary;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOTAL_LABEL: &str = "Total";

/// Row dimension for a status pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Owner,
    PeriodWeek,
    BusinessTypeAndType,
    TaskType,
}

impl GroupKey {
    pub const fn dimensions(self) -> &'static [&'static str] {
        match self {
            Self::Owner => &["Specialist"],
            Self::PeriodWeek => &["Quarter", "Week"],
            Self::BusinessTypeAndType => &["Business Type", "Type"],
            Self::TaskType => &["Type"],
        }
    }

    fn key_for(self, record: &TaskRecord) -> Vec<String> {
        match self {
            Self::Owner => vec![record.owner.clone()],
            Self::PeriodWeek => vec![record.period.to_string(), record.week.clone()],
            Self::BusinessTypeAndType => {
                vec![record.business_type.clone(), record.task_type.clone()]
            }
            Self::TaskType => vec![record.task_type.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<String>,
    pub counts: Vec<usize>,
    pub total: usize,
}

impl AggregateRow {
    fn new(key: Vec<String>, counts: Vec<usize>) -> Self {
        let total = counts.iter().sum();
        Self { key, counts, total }
    }
}

/// Grouped count table: one row per key, one column per vocabulary status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateView {
    pub dimensions: Vec<&'static str>,
    pub statuses: StatusVocabulary,
    pub rows: Vec<AggregateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<AggregateRow>,
}

impl AggregateView {
    pub(crate) fn from_counts<I>(
        dimensions: &[&'static str],
        statuses: StatusVocabulary,
        rows: I,
    ) -> Self
    where
        I: IntoIterator<Item = (Vec<String>, Vec<usize>)>,
    {
        Self {
            dimensions: dimensions.to_vec(),
            statuses,
            rows: rows
                .into_iter()
                .map(|(key, counts)| AggregateRow::new(key, counts))
                .collect(),
            totals: None,
        }
    }

    pub fn row(&self, key: &[&str]) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| {
            row.key.len() == key.len() && row.key.iter().zip(key).all(|(a, b)| a == b)
        })
    }

    pub fn count(&self, key: &[&str], status: &TaskStatus) -> Option<usize> {
        let column = self.statuses.position(status)?;
        self.row(key).map(|row| row.counts[column])
    }

    /// Orders rows by descending total; equal totals keep their current order.
    pub fn sort_by_total_desc(mut self) -> Self {
        self.rows.sort_by(|a, b| b.total.cmp(&a.total));
        self
    }

    /// Appends a `Total` row summing every status column.
    pub fn with_totals_row(mut self) -> Self {
        let mut counts = vec![0; self.statuses.len()];
        for row in &self.rows {
            for (sum, count) in counts.iter_mut().zip(&row.counts) {
                *sum += count;
            }
        }

        let key = self
            .dimensions
            .iter()
            .enumerate()
            .map(|(index, _)| {
                if index == 0 {
                    TOTAL_LABEL.to_string()
                } else {
                    String::new()
                }
            })
            .collect();
        self.totals = Some(AggregateRow::new(key, counts));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

/// Single-row view of status counts across the whole slice.
pub fn status_distribution(records: &[TaskRecord], vocabulary: &StatusVocabulary) -> AggregateView {
    let statuses = vocabulary.union(&StatusVocabulary::from_records(records));
    let mut counts = vec![0; statuses.len()];
    for record in records {
        if let Some(column) = statuses.position(&record.status) {
            counts[column] += 1;
        }
    }

    AggregateView::from_counts(&[], statuses, [(Vec::new(), counts)])
}

/// Status counts ordered by descending count, ties in canonical status order.
pub fn status_counts(records: &[TaskRecord]) -> Vec<StatusCount> {
    let mut counts: BTreeMap<&TaskStatus, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(&record.status).or_default() += 1;
    }

    let mut entries: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status, count)| StatusCount {
            status: status.clone(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Pivot of record counts by `key` × status.
///
/// Columns are `vocabulary` plus any status observed in `records`, so no
/// record is ever left uncounted. Rows are sorted by key.
pub fn group_by(records: &[TaskRecord], key: GroupKey, vocabulary: &StatusVocabulary) -> AggregateView {
    let statuses = vocabulary.union(&StatusVocabulary::from_records(records));
    let mut grouped: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();

    for record in records {
        let Some(column) = statuses.position(&record.status) else {
            continue;
        };
        let counts = grouped
            .entry(key.key_for(record))
            .or_insert_with(|| vec![0; statuses.len()]);
        counts[column] += 1;
    }

    AggregateView::from_counts(key.dimensions(), statuses, grouped)
}

/// Percentage of `completed` over `total`, one decimal, zero when `total` is zero.
/// Halves round to even, so 6.25 reports as 6.2.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tracker::domain::PeriodKey;
    use chrono::{Local, TimeZone};

    fn record(owner: &str, week: &str, status: &str, task_type: &str) -> TaskRecord {
        TaskRecord {
            period: PeriodKey::new("2025_Q3"),
            week: week.to_string(),
            station: format!("{owner}-{week}-{status}"),
            status: TaskStatus::parse(status),
            delivery_window: "AM".to_string(),
            business_type: "Grocery".to_string(),
            chain: "North".to_string(),
            owner: owner.to_string(),
            category: task_type.to_string(),
            task_type: task_type.to_string(),
            captured_at: Local
                .with_ymd_and_hms(2025, 9, 24, 10, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn sample() -> Vec<TaskRecord> {
        vec![
            record("Alice", "WK01", "Complete", "Launch"),
            record("Bob", "WK01", "In Progress", "Launch"),
            record("Alice", "WK02", "Blocked", "Audit"),
            record("Bob", "WK02", "Complete", "Audit"),
            record("Bob", "WK02", "Merged", "Launch"),
        ]
    }

    #[test]
    fn specialist_pivot_zero_fills_and_totals_rows() {
        let records = sample();
        let vocabulary = StatusVocabulary::from_records(&records);
        let view = group_by(&records, GroupKey::Owner, &vocabulary);

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.count(&["Alice"], &TaskStatus::Merged), Some(0));
        assert_eq!(view.count(&["Bob"], &TaskStatus::Merged), Some(1));
        for row in &view.rows {
            assert_eq!(row.total, row.counts.iter().sum::<usize>());
        }
    }

    #[test]
    fn pivot_columns_follow_scope_vocabulary() {
        let records = sample();
        let vocabulary = StatusVocabulary::with_known(&records);
        let week_one: Vec<_> = records
            .iter()
            .filter(|record| record.week == "WK01")
            .cloned()
            .collect();

        let view = group_by(&week_one, GroupKey::TaskType, &vocabulary);
        assert_eq!(view.statuses, vocabulary);
        assert_eq!(view.count(&["Launch"], &TaskStatus::Blocked), Some(0));
    }

    #[test]
    fn totals_row_sums_every_column() {
        let records = sample();
        let vocabulary = StatusVocabulary::from_records(&records);
        let view = group_by(&records, GroupKey::PeriodWeek, &vocabulary).with_totals_row();

        let totals = view.totals.as_ref().expect("totals row present");
        assert_eq!(totals.key, vec!["Total".to_string(), String::new()]);
        assert_eq!(totals.total, records.len());
        let complete = vocabulary
            .position(&TaskStatus::Complete)
            .expect("complete column");
        assert_eq!(totals.counts[complete], 2);
    }

    #[test]
    fn sort_by_total_is_stable_for_ties() {
        let records = vec![
            record("Zed", "WK01", "Complete", "Launch"),
            record("Amy", "WK01", "Blocked", "Launch"),
            record("Kim", "WK01", "Blocked", "Launch"),
            record("Kim", "WK02", "Blocked", "Launch"),
        ];
        let vocabulary = StatusVocabulary::from_records(&records);
        let view = group_by(&records, GroupKey::Owner, &vocabulary).sort_by_total_desc();

        let order: Vec<_> = view.rows.iter().map(|row| row.key[0].as_str()).collect();
        assert_eq!(order, ["Kim", "Amy", "Zed"]);
    }

    #[test]
    fn status_counts_orders_by_frequency() {
        let counts = status_counts(&sample());
        assert_eq!(counts[0].status, TaskStatus::Complete);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts.iter().map(|entry| entry.count).sum::<usize>(), 5);
    }

    #[test]
    fn distribution_is_a_single_row() {
        let records = sample();
        let view = status_distribution(&records, &StatusVocabulary::default());
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].total, 5);
        assert!(view.dimensions.is_empty());
    }

    #[test]
    fn completion_rate_guards_zero_total() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 2), 50.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert!(completion_rate(5, 0).is_finite());
    }

    #[test]
    fn completion_rate_rounds_halves_to_even() {
        assert_eq!(completion_rate(1, 16), 6.2);
        assert_eq!(completion_rate(5, 16), 31.2);
        assert_eq!(completion_rate(3, 16), 18.8);
        assert_eq!(completion_rate(7, 8), 87.5);
    }
}
