use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Named `TaskRecord` fields that come from row cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Station,
    Status,
    DeliveryWindow,
    BusinessType,
    Chain,
    Owner,
    Category,
    TaskType,
}

impl RecordField {
    pub const ALL: [RecordField; 8] = [
        Self::Station,
        Self::Status,
        Self::DeliveryWindow,
        Self::BusinessType,
        Self::Chain,
        Self::Owner,
        Self::Category,
        Self::TaskType,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::Status => "status",
            Self::DeliveryWindow => "delivery_window",
            Self::BusinessType => "business_type",
            Self::Chain => "chain",
            Self::Owner => "owner",
            Self::Category => "category",
            Self::TaskType => "type",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnBinding {
    pub field: RecordField,
    pub index: usize,
    pub required: bool,
    /// Lowercase text the header cell at `index` is expected to contain.
    pub header_hint: Option<&'static str>,
}

impl ColumnBinding {
    const fn optional(field: RecordField, index: usize) -> Self {
        Self {
            field,
            index,
            required: false,
            header_hint: None,
        }
    }

    const fn hinted(field: RecordField, index: usize, required: bool, hint: &'static str) -> Self {
        Self {
            field,
            index,
            required,
            header_hint: Some(hint),
        }
    }
}

const STANDARD_V1: [ColumnBinding; 8] = [
    ColumnBinding::hinted(RecordField::Station, 1, true, "station"),
    ColumnBinding::hinted(RecordField::Status, 2, true, "status"),
    ColumnBinding::optional(RecordField::DeliveryWindow, 3),
    ColumnBinding::optional(RecordField::BusinessType, 6),
    ColumnBinding::optional(RecordField::Chain, 9),
    ColumnBinding::optional(RecordField::Owner, 14),
    ColumnBinding::optional(RecordField::Category, 17),
    ColumnBinding::hinted(RecordField::TaskType, 17, false, "type"),
];

const STANDARD_MIN_COLUMNS: usize = 19;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("column schema needs a positive minimum width")]
    ZeroWidth,
    #[error("column {index} for {field} lies outside the minimum width of {min_columns}")]
    IndexOutOfRange {
        field: RecordField,
        index: usize,
        min_columns: usize,
    },
    #[error("{field} is bound more than once")]
    DuplicateField { field: RecordField },
    #[error("{field} has no column")]
    UnboundField { field: RecordField },
}

/// Header cell that does not look like the column a binding expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMismatch {
    pub field: RecordField,
    pub index: usize,
    pub expected: &'static str,
    pub found: Option<String>,
}

/// Positional cell layout of a weekly table, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    version: u32,
    min_columns: usize,
    bindings: Vec<ColumnBinding>,
}

impl ColumnSchema {
    pub fn new(
        version: u32,
        min_columns: usize,
        bindings: Vec<ColumnBinding>,
    ) -> Result<Self, SchemaError> {
        if min_columns == 0 {
            return Err(SchemaError::ZeroWidth);
        }

        let mut bound = BTreeSet::new();
        for binding in &bindings {
            if binding.index >= min_columns {
                return Err(SchemaError::IndexOutOfRange {
                    field: binding.field,
                    index: binding.index,
                    min_columns,
                });
            }
            if !bound.insert(binding.field) {
                return Err(SchemaError::DuplicateField {
                    field: binding.field,
                });
            }
        }
        if let Some(field) = RecordField::ALL
            .into_iter()
            .find(|field| !bound.contains(field))
        {
            return Err(SchemaError::UnboundField { field });
        }

        Ok(Self {
            version,
            min_columns,
            bindings,
        })
    }

    /// Layout observed in the quarterly tracker documents.
    pub fn standard() -> Self {
        Self {
            version: 1,
            min_columns: STANDARD_MIN_COLUMNS,
            bindings: STANDARD_V1.to_vec(),
        }
    }

    /// Same bindings with a different row-width threshold.
    pub fn with_min_columns(self, min_columns: usize) -> Result<Self, SchemaError> {
        Self::new(self.version, min_columns, self.bindings)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn min_columns(&self) -> usize {
        self.min_columns
    }

    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }

    pub fn binding(&self, field: RecordField) -> Option<&ColumnBinding> {
        self.bindings.iter().find(|binding| binding.field == field)
    }

    /// Hinted columns whose header cell is missing or does not contain the hint.
    pub fn header_mismatches(&self, header: &[String]) -> Vec<HeaderMismatch> {
        self.bindings
            .iter()
            .filter_map(|binding| {
                let expected = binding.header_hint?;
                let found = header.get(binding.index);
                let matches = found
                    .map(|cell| cell.to_lowercase().contains(expected))
                    .unwrap_or(false);
                (!matches).then(|| HeaderMismatch {
                    field: binding.field,
                    index: binding.index,
                    expected,
                    found: found.cloned(),
                })
            })
            .collect()
    }
}
