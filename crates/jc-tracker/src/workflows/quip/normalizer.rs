use super::extractor::TaggedRow;
use super::schema::{ColumnSchema, RecordField};
use crate::workflows::tracker::{PeriodKey, TaskRecord, TaskStatus};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Strips BOM and zero-width spaces, collapses whitespace runs, trims.
pub(crate) fn normalize_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fields that must never carry their own header text.
const ECHO_GUARDED: [(RecordField, &str); 2] =
    [(RecordField::Status, "status"), (RecordField::TaskType, "type")];

/// Where a pass's records came from.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub period: &'a PeriodKey,
    pub captured_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("row has {found} cells, needs {required}")]
    TooFewColumns { found: usize, required: usize },
    #[error("required {0} is empty")]
    MissingRequired(RecordField),
    #[error("{0} repeats its header text")]
    HeaderEcho(RecordField),
}

/// Rows dropped in one pass, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropSummary {
    pub too_few_columns: usize,
    pub missing_required: usize,
    pub header_echo: usize,
}

impl DropSummary {
    pub fn record(&mut self, violation: &SchemaViolation) {
        match violation {
            SchemaViolation::TooFewColumns { .. } => self.too_few_columns += 1,
            SchemaViolation::MissingRequired(_) => self.missing_required += 1,
            SchemaViolation::HeaderEcho(_) => self.header_echo += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.too_few_columns + self.missing_required + self.header_echo
    }
}

/// Maps a row onto a `TaskRecord` through `schema`.
pub fn normalize(
    row: &TaggedRow,
    schema: &ColumnSchema,
    provenance: &Provenance<'_>,
) -> Result<TaskRecord, SchemaViolation> {
    if row.cells.len() < schema.min_columns() {
        return Err(SchemaViolation::TooFewColumns {
            found: row.cells.len(),
            required: schema.min_columns(),
        });
    }

    let cell = |field: RecordField| -> String {
        schema
            .binding(field)
            .and_then(|binding| row.cells.get(binding.index))
            .map(|value| normalize_cell(value))
            .unwrap_or_default()
    };

    for binding in schema.bindings().iter().filter(|binding| binding.required) {
        if cell(binding.field).is_empty() {
            return Err(SchemaViolation::MissingRequired(binding.field));
        }
    }
    for (field, literal) in ECHO_GUARDED {
        if cell(field).eq_ignore_ascii_case(literal) {
            return Err(SchemaViolation::HeaderEcho(field));
        }
    }

    Ok(TaskRecord {
        period: provenance.period.clone(),
        week: row.table_label.clone(),
        station: cell(RecordField::Station),
        status: TaskStatus::parse(&cell(RecordField::Status)),
        delivery_window: cell(RecordField::DeliveryWindow),
        business_type: cell(RecordField::BusinessType),
        chain: cell(RecordField::Chain),
        owner: cell(RecordField::Owner),
        category: cell(RecordField::Category),
        task_type: cell(RecordField::TaskType),
        captured_at: provenance.captured_at,
    })
}
