use super::domain::TaskRecord;
use chrono::{DateTime, Local};
use std::io::Write;

/// Header of the flat record export, one column per `TaskRecord` field.
pub const RECORD_COLUMNS: [&str; 11] = [
    "period",
    "week",
    "station",
    "status",
    "delivery_window",
    "business_type",
    "chain",
    "owner",
    "category",
    "type",
    "captured_at",
];

/// Writes one CSV row per record. The header is written even for an empty set.
pub fn write_records_csv<W: Write>(records: &[TaskRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(RECORD_COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn records_csv_file_name(at: DateTime<Local>) -> String {
    format!("raw_data_{}.csv", at.format("%Y%m%d_%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tracker::domain::{PeriodKey, TaskStatus};
    use chrono::TimeZone;

    fn captured_at() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 10, 6, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn exports_header_and_one_row_per_record() {
        let record = TaskRecord {
            period: PeriodKey::new("2025_Q4"),
            week: "WK41".to_string(),
            station: "DAB5".to_string(),
            status: TaskStatus::InProgress,
            delivery_window: "Cycle 1".to_string(),
            business_type: "Grocery, Fresh".to_string(),
            chain: "Central".to_string(),
            owner: "Priya".to_string(),
            category: "Launch".to_string(),
            task_type: "Launch".to_string(),
            captured_at: captured_at(),
        };

        let mut buffer = Vec::new();
        write_records_csv(&[record], &mut buffer).expect("export succeeds");
        let text = String::from_utf8(buffer).expect("utf8 output");
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], RECORD_COLUMNS.join(","));
        assert!(lines[1].starts_with(
            "2025_Q4,WK41,DAB5,In Progress,Cycle 1,\"Grocery, Fresh\",Central,Priya,Launch,Launch,2025-10-06T09:30:00"
        ));
    }

    #[test]
    fn empty_export_still_has_header() {
        let mut buffer = Vec::new();
        write_records_csv(&[], &mut buffer).expect("export succeeds");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8 output").trim_end(),
            RECORD_COLUMNS.join(",")
        );
    }

    #[test]
    fn file_name_uses_minute_timestamp() {
        assert_eq!(
            records_csv_file_name(captured_at()),
            "raw_data_20251006_0930.csv"
        );
    }
}
