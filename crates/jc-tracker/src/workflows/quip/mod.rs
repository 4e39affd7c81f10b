mod extractor;
mod normalizer;
mod schema;
mod source;

pub use extractor::{ExtractedTable, TableExtractor, TaggedRow};
pub use normalizer::{normalize, DropSummary, Provenance, SchemaViolation};
pub use schema::{ColumnBinding, ColumnSchema, HeaderMismatch, RecordField, SchemaError};
pub use source::{DirectorySource, DocumentSource, InlineSource, RetrievalError, SourceDocument};

use crate::config::SourceConfig;
use crate::workflows::tracker::{retain_owners, PeriodKey, TaskRecord};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub const DEFAULT_TABLE_PREFIX: &str = "WK";
pub const DEFAULT_MIN_COLUMNS: usize = 19;

#[derive(Debug)]
pub enum QuipImportError {
    Schema(SchemaError),
    NothingLoaded { failures: Vec<PeriodFailure> },
    NoPeriodsSelected,
    UnknownPeriods { periods: Vec<PeriodKey> },
    NoWeeksSelected,
}

impl std::fmt::Display for QuipImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuipImportError::Schema(err) => write!(f, "invalid column schema: {}", err),
            QuipImportError::NothingLoaded { failures } => {
                write!(f, "no tracker document could be loaded")?;
                for failure in failures {
                    write!(f, "; {}: {}", failure.period, failure.message)?;
                }
                Ok(())
            }
            QuipImportError::NoPeriodsSelected => write!(f, "select at least one quarter"),
            QuipImportError::UnknownPeriods { periods } => {
                let keys: Vec<&str> = periods.iter().map(PeriodKey::as_str).collect();
                write!(f, "unknown quarters requested: {}", keys.join(", "))
            }
            QuipImportError::NoWeeksSelected => {
                write!(f, "no weekly tables matched the selection")
            }
        }
    }
}

impl std::error::Error for QuipImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuipImportError::Schema(err) => Some(err),
            QuipImportError::NothingLoaded { .. }
            | QuipImportError::NoPeriodsSelected
            | QuipImportError::UnknownPeriods { .. }
            | QuipImportError::NoWeeksSelected => None,
        }
    }
}

impl From<SchemaError> for QuipImportError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

/// A quarter whose document could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodFailure {
    pub period: PeriodKey,
    pub message: String,
}

/// Documents fetched for one pass, plus the quarters that failed.
#[derive(Debug, Clone, Default)]
pub struct LoadedPeriods {
    documents: Vec<SourceDocument>,
    failures: Vec<PeriodFailure>,
}

impl LoadedPeriods {
    /// Fetches each period in order. A failure only drops that period.
    pub fn fetch<S>(source: &S, periods: &[PeriodKey]) -> Self
    where
        S: DocumentSource + ?Sized,
    {
        let mut loaded = Self::default();
        for period in periods {
            match source.fetch(period) {
                Ok(document) => loaded.documents.push(document),
                Err(err) => {
                    warn!(%period, error = %err, "failed to load tracker document");
                    loaded.failures.push(PeriodFailure {
                        period: period.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        loaded
    }

    pub fn from_documents(documents: Vec<SourceDocument>) -> Self {
        Self {
            documents,
            failures: Vec::new(),
        }
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn failures(&self) -> &[PeriodFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Errors when nothing was requested or nothing could be read.
    pub fn ensure_loaded(&self) -> Result<(), QuipImportError> {
        if !self.documents.is_empty() {
            return Ok(());
        }
        if self.failures.is_empty() {
            Err(QuipImportError::NoPeriodsSelected)
        } else {
            Err(QuipImportError::NothingLoaded {
                failures: self.failures.clone(),
            })
        }
    }
}

/// Weekly tables found in one quarter's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTables {
    pub period: PeriodKey,
    pub tables: Vec<String>,
}

/// Which weekly tables a pass should read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeekSelection {
    /// The last available week label.
    #[default]
    Latest,
    All,
    Explicit(Vec<String>),
}

impl WeekSelection {
    pub fn from_args(weeks: Vec<String>, all_weeks: bool) -> Self {
        if all_weeks {
            Self::All
        } else if weeks.is_empty() {
            Self::Latest
        } else {
            Self::Explicit(weeks)
        }
    }

    /// Weeks to read, drawn from `available` (sorted).
    pub fn resolve(&self, available: &[String]) -> Vec<String> {
        match self {
            Self::Latest => available.last().cloned().into_iter().collect(),
            Self::All => available.to_vec(),
            Self::Explicit(weeks) => weeks
                .iter()
                .map(|week| week.trim().to_string())
                .filter(|week| !week.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

/// Records produced by one import pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub weeks: Vec<String>,
    pub records: Vec<TaskRecord>,
    pub dropped: DropSummary,
    pub failures: Vec<PeriodFailure>,
    pub captured_at: DateTime<Local>,
}

/// Turns quarterly documents into `TaskRecord`s.
#[derive(Debug, Clone)]
pub struct QuipImporter {
    extractor: TableExtractor,
    schema: ColumnSchema,
}

impl QuipImporter {
    pub fn new(extractor: TableExtractor, schema: ColumnSchema) -> Self {
        Self { extractor, schema }
    }

    pub fn standard() -> Self {
        Self::new(TableExtractor::default(), ColumnSchema::standard())
    }

    /// Standard schema with the configured prefix and row width.
    pub fn from_config(config: &SourceConfig) -> Result<Self, QuipImportError> {
        let schema = ColumnSchema::standard().with_min_columns(config.min_columns)?;
        let extractor = TableExtractor::new(config.table_prefix.clone(), config.min_columns);
        Ok(Self::new(extractor, schema))
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn tables_by_period(&self, loaded: &LoadedPeriods) -> Vec<PeriodTables> {
        loaded
            .documents()
            .iter()
            .map(|document| PeriodTables {
                period: document.period.clone(),
                tables: self.extractor.list_tables(&document.html),
            })
            .collect()
    }

    /// Sorted union of week labels across every loaded quarter.
    pub fn available_weeks(&self, loaded: &LoadedPeriods) -> Vec<String> {
        self.tables_by_period(loaded)
            .into_iter()
            .flat_map(|period| period.tables)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn import(&self, loaded: &LoadedPeriods, weeks: &[String]) -> ImportOutcome {
        self.import_at(loaded, weeks, Local::now())
    }

    /// Extracts and normalizes the wanted weeks; every record shares `captured_at`.
    pub fn import_at(
        &self,
        loaded: &LoadedPeriods,
        weeks: &[String],
        captured_at: DateTime<Local>,
    ) -> ImportOutcome {
        let mut records = Vec::new();
        let mut dropped = DropSummary::default();

        for document in loaded.documents() {
            let provenance = Provenance {
                period: &document.period,
                captured_at,
            };

            for table in self.extractor.extract_tables(&document.html, weeks) {
                for mismatch in self.schema.header_mismatches(&table.header) {
                    warn!(
                        period = %document.period,
                        table = %table.label,
                        field = %mismatch.field,
                        column = mismatch.index,
                        found = mismatch.found.as_deref().unwrap_or(""),
                        "header does not match column schema"
                    );
                }
                dropped.too_few_columns += table.narrow_rows;

                for row in &table.rows {
                    match normalize(row, &self.schema, &provenance) {
                        Ok(record) => records.push(record),
                        Err(violation) => {
                            debug!(table = %row.table_label, reason = %violation, "dropped row");
                            dropped.record(&violation);
                        }
                    }
                }
            }
        }

        info!(
            periods = loaded.documents().len(),
            weeks = weeks.len(),
            records = records.len(),
            dropped = dropped.total(),
            "import pass complete"
        );

        ImportOutcome {
            weeks: weeks.to_vec(),
            records,
            dropped,
            failures: loaded.failures().to_vec(),
            captured_at,
        }
    }

    /// Resolves the week selection, imports, then keeps only `owners`
    /// (all owners when empty).
    pub fn run(
        &self,
        loaded: &LoadedPeriods,
        selection: &WeekSelection,
        owners: &[String],
    ) -> Result<ImportOutcome, QuipImportError> {
        loaded.ensure_loaded()?;

        let weeks = selection.resolve(&self.available_weeks(loaded));
        if weeks.is_empty() {
            return Err(QuipImportError::NoWeeksSelected);
        }

        let mut outcome = self.import(loaded, &weeks);
        outcome.records = retain_owners(outcome.records, owners);
        Ok(outcome)
    }
}
