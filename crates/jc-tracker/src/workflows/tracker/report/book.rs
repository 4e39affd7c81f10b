use super::super::domain::TaskRecord;
use super::aggregate::{group_by, status_counts, AggregateView, GroupKey};
use super::ranking::{rank_specialists, RANKING_COLUMNS};
use super::vocabulary::StatusVocabulary;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;

/// Where the per-row total column sits in a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalPlacement {
    AfterKey(&'static str),
    Trailing(&'static str),
    Omitted,
}

/// A titled grid of string cells with a fixed column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NamedTable {
    pub fn from_view(title: impl Into<String>, view: &AggregateView, total: TotalPlacement) -> Self {
        let mut columns: Vec<String> = view.dimensions.iter().map(|d| d.to_string()).collect();
        if let TotalPlacement::AfterKey(label) = total {
            columns.push(label.to_string());
        }
        columns.extend(view.statuses.labels().map(str::to_string));
        if let TotalPlacement::Trailing(label) = total {
            columns.push(label.to_string());
        }

        let rows = view
            .rows
            .iter()
            .chain(view.totals.iter())
            .map(|row| {
                let mut cells = row.key.clone();
                if let TotalPlacement::AfterKey(_) = total {
                    cells.push(row.total.to_string());
                }
                cells.extend(row.counts.iter().map(usize::to_string));
                if let TotalPlacement::Trailing(_) = total {
                    cells.push(row.total.to_string());
                }
                cells
            })
            .collect();

        Self {
            title: title.into(),
            columns,
            rows,
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSheet {
    pub name: String,
    pub tables: Vec<NamedTable>,
}

impl ReportSheet {
    pub fn table(&self, title: &str) -> Option<&NamedTable> {
        self.tables.iter().find(|table| table.title == title)
    }
}

/// The named tables a spreadsheet report is built from.
///
/// All pivots share one status vocabulary so every sheet lines up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportBook {
    pub sheets: Vec<ReportSheet>,
}

impl ReportBook {
    pub fn build(records: &[TaskRecord], selected_weeks: &[String]) -> Self {
        let vocabulary = StatusVocabulary::from_records(records);

        let sheets = vec![
            status_overview(records, &vocabulary),
            weekly_details(records, selected_weeks, &vocabulary),
            specialist_details(records, &vocabulary),
            performance_rankings(records),
        ];

        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&ReportSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

fn status_overview(records: &[TaskRecord], vocabulary: &StatusVocabulary) -> ReportSheet {
    let distribution = NamedTable {
        title: "Status Distribution".to_string(),
        columns: vec!["Status".to_string(), "Count".to_string()],
        rows: status_counts(records)
            .into_iter()
            .map(|entry| vec![entry.status.to_string(), entry.count.to_string()])
            .collect(),
    };

    let by_week = group_by(records, GroupKey::PeriodWeek, vocabulary);
    let by_specialist = group_by(records, GroupKey::Owner, vocabulary)
        .sort_by_total_desc()
        .with_totals_row();

    ReportSheet {
        name: "Status Overview".to_string(),
        tables: vec![
            distribution,
            NamedTable::from_view("Status Summary by Week", &by_week, TotalPlacement::Omitted),
            NamedTable::from_view(
                "Status Summary by Specialist",
                &by_specialist,
                TotalPlacement::AfterKey("Total Tasks"),
            ),
        ],
    }
}

fn weekly_details(
    records: &[TaskRecord],
    selected_weeks: &[String],
    vocabulary: &StatusVocabulary,
) -> ReportSheet {
    let tables = selected_weeks
        .iter()
        .map(|week| {
            let week_records: Vec<TaskRecord> = records
                .iter()
                .filter(|record| &record.week == week)
                .cloned()
                .collect();
            let view = group_by(&week_records, GroupKey::TaskType, vocabulary).with_totals_row();
            NamedTable::from_view(
                format!("Week {week} Details"),
                &view,
                TotalPlacement::Trailing("Total"),
            )
        })
        .collect();

    ReportSheet {
        name: "Weekly Details".to_string(),
        tables,
    }
}

fn specialist_details(records: &[TaskRecord], vocabulary: &StatusVocabulary) -> ReportSheet {
    let mut tables = Vec::new();
    for owner in owners_in_appearance_order(records) {
        let owned: Vec<TaskRecord> = records
            .iter()
            .filter(|record| record.owner == owner)
            .cloned()
            .collect();

        let breakdown =
            group_by(&owned, GroupKey::BusinessTypeAndType, vocabulary).with_totals_row();
        tables.push(NamedTable::from_view(
            format!("{owner} Status Distribution"),
            &breakdown,
            TotalPlacement::Trailing("Total"),
        ));

        let progress = group_by(&owned, GroupKey::PeriodWeek, vocabulary).with_totals_row();
        tables.push(NamedTable::from_view(
            format!("{owner} Weekly Progress"),
            &progress,
            TotalPlacement::Trailing("Total"),
        ));
    }

    ReportSheet {
        name: "Specialist Details".to_string(),
        tables,
    }
}

fn performance_rankings(records: &[TaskRecord]) -> ReportSheet {
    let table = NamedTable {
        title: "Performance Rankings".to_string(),
        columns: RANKING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: rank_specialists(records)
            .iter()
            .map(|row| row.cells())
            .collect(),
    };

    ReportSheet {
        name: "Performance Rankings".to_string(),
        tables: vec![table],
    }
}

fn owners_in_appearance_order(records: &[TaskRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.owner.as_str())
        .filter(|owner| seen.insert(*owner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tracker::domain::{PeriodKey, TaskStatus};
    use chrono::Local;

    fn record(owner: &str, week: &str, status: TaskStatus, task_type: &str) -> TaskRecord {
        TaskRecord {
            period: PeriodKey::new("2026_Q1"),
            week: week.to_string(),
            station: "DXX1".to_string(),
            status,
            delivery_window: "PM".to_string(),
            business_type: "Retail".to_string(),
            chain: "East".to_string(),
            owner: owner.to_string(),
            category: task_type.to_string(),
            task_type: task_type.to_string(),
            captured_at: Local::now(),
        }
    }

    fn sample() -> Vec<TaskRecord> {
        vec![
            record("Bea", "WK02", TaskStatus::Complete, "Launch"),
            record("Al", "WK01", TaskStatus::Blocked, "Audit"),
            record("Al", "WK02", TaskStatus::Published, "Launch"),
        ]
    }

    #[test]
    fn book_exposes_the_four_sheets() {
        let weeks = vec!["WK01".to_string(), "WK02".to_string()];
        let book = ReportBook::build(&sample(), &weeks);

        let names: Vec<_> = book.sheets.iter().map(|sheet| sheet.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Status Overview",
                "Weekly Details",
                "Specialist Details",
                "Performance Rankings"
            ]
        );

        let weekly = book.sheet("Weekly Details").expect("weekly sheet");
        assert_eq!(weekly.tables.len(), 2);
        assert_eq!(weekly.tables[0].title, "Week WK01 Details");

        let specialists = book.sheet("Specialist Details").expect("specialist sheet");
        assert_eq!(specialists.tables[0].title, "Bea Status Distribution");
    }

    #[test]
    fn tables_share_one_column_set() {
        let weeks = vec!["WK01".to_string(), "WK02".to_string()];
        let book = ReportBook::build(&sample(), &weeks);
        let weekly = book.sheet("Weekly Details").expect("weekly sheet");

        assert_eq!(weekly.tables[0].columns, weekly.tables[1].columns);
        assert_eq!(
            weekly.tables[0].columns,
            ["Type", "Complete", "Published", "Blocked", "Total"]
        );
        let last = weekly.tables[0].rows.last().expect("totals row");
        assert_eq!(last, &["Total", "0", "0", "1", "1"]);
    }

    #[test]
    fn specialist_summary_puts_total_after_name() {
        let book = ReportBook::build(&sample(), &[]);
        let overview = book.sheet("Status Overview").expect("overview sheet");
        let summary = overview
            .table("Status Summary by Specialist")
            .expect("summary table");

        assert_eq!(summary.columns[..2], ["Specialist", "Total Tasks"]);
        assert_eq!(summary.rows[0][..2], ["Al", "2"]);
        assert_eq!(summary.rows.last().expect("total row")[..2], ["Total", "3"]);
    }

    #[test]
    fn write_csv_emits_header_and_rows() {
        let book = ReportBook::build(&sample(), &[]);
        let rankings = &book.sheet("Performance Rankings").expect("sheet").tables[0];

        let mut buffer = Vec::new();
        rankings.write_csv(&mut buffer).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Rank,Specialist,Total Tasks,Completed+Published+Merged,Completed,Published,Merged,In Progress,Blocked,Completion Rate (%)")
        );
        assert_eq!(lines.next(), Some("1,Al,2,1,0,1,0,0,1,50.0"));
    }
}
