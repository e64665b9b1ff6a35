//! Table schemas and column type inference.
//!
//! Type inference follows a fixed priority: a column is `Int64` iff every
//! non-null cell parses as an integer, else `Float64` iff every non-null cell
//! parses as a decimal, else `Bool` iff every non-null cell is a boolean
//! token, else `Utf8Text`. A column without any non-null cell (including
//! every column of a table with zero rows) is vacuously `Int64`.

use crate::types::{is_null_token, ColumnType};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Error Types
// ============================================================================

/// Error raised while resolving a schema or building a table from raw rows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaInferenceError {
    /// Rows were supplied without any column names
    #[error("Table has {rows} rows but no columns")]
    NoColumns { rows: usize },

    /// The same column name appears twice
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A row does not have one cell per column
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A cell does not parse as the column's resolved type
    #[error("Column '{column}' row {row}: '{value}' is not a valid {expected}")]
    TypeMismatch {
        column: String,
        row: usize,
        value: String,
        expected: ColumnType,
    },

    /// A type pin names a column the table does not have
    #[error("Type pin for unknown column: {0}")]
    UnknownColumn(String),
}

// ============================================================================
// Schema
// ============================================================================

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Resolved storage type
    pub column_type: ColumnType,
}

impl ColumnSpec {
    /// Create a new column spec.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered column specs of one reference table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Create a schema from explicit column specs.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, SchemaInferenceError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaInferenceError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Infer every column type from the rows.
    pub fn infer<N, R, S>(column_names: &[N], rows: &[R]) -> Result<Self, SchemaInferenceError>
    where
        N: AsRef<str>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self::infer_with_pins(column_names, rows, &HashMap::new())
    }

    /// Infer column types, except for pinned columns whose type is given.
    ///
    /// Pinned columns are still validated: every non-null cell must parse as
    /// the pinned type.
    pub fn infer_with_pins<N, R, S>(
        column_names: &[N],
        rows: &[R],
        pins: &HashMap<String, ColumnType>,
    ) -> Result<Self, SchemaInferenceError>
    where
        N: AsRef<str>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if column_names.is_empty() && !rows.is_empty() {
            return Err(SchemaInferenceError::NoColumns { rows: rows.len() });
        }
        if let Some(unknown) = pins
            .keys()
            .find(|pin| !column_names.iter().any(|n| n.as_ref() == pin.as_str()))
        {
            return Err(SchemaInferenceError::UnknownColumn(unknown.clone()));
        }
        check_shape(rows, column_names.len())?;

        let mut columns = Vec::with_capacity(column_names.len());
        for (idx, name) in column_names.iter().enumerate() {
            let name = name.as_ref();
            let column_type = match pins.get(name) {
                Some(&pinned) => {
                    validate_column(rows, idx, name, pinned)?;
                    pinned
                }
                None => infer_column(rows, idx),
            };
            columns.push(ColumnSpec::new(name, column_type));
        }

        let schema = Self::new(columns)?;
        tracing::debug!(
            "Inferred schema over {} rows: {}",
            rows.len(),
            schema.describe()
        );
        Ok(schema)
    }

    /// Column specs in table order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Number of `Utf8Text` columns.
    pub fn text_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.column_type == ColumnType::Utf8Text)
            .count()
    }

    /// `name:type` pairs, comma separated, for log lines.
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}:{}", c.name, c.column_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Verify every row has exactly `expected` cells.
pub(crate) fn check_shape<R, S>(rows: &[R], expected: usize) -> Result<(), SchemaInferenceError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    for (row, cells) in rows.iter().enumerate() {
        let found = cells.as_ref().len();
        if found != expected {
            return Err(SchemaInferenceError::RaggedRow {
                row,
                expected,
                found,
            });
        }
    }
    Ok(())
}

fn infer_column<R, S>(rows: &[R], col: usize) -> ColumnType
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    // Int64, Float64, Bool; Utf8Text always remains viable
    let mut viable = [true; 3];

    for cells in rows {
        let cell = cells.as_ref()[col].as_ref();
        if is_null_token(cell) {
            continue;
        }
        for (slot, column_type) in viable.iter_mut().zip(ColumnType::INFERENCE_ORDER) {
            if *slot && !column_type.accepts(cell) {
                *slot = false;
            }
        }
        if !viable.contains(&true) {
            return ColumnType::Utf8Text;
        }
    }

    ColumnType::INFERENCE_ORDER
        .into_iter()
        .zip(viable)
        .find_map(|(column_type, ok)| ok.then_some(column_type))
        .unwrap_or(ColumnType::Utf8Text)
}

fn validate_column<R, S>(
    rows: &[R],
    col: usize,
    name: &str,
    column_type: ColumnType,
) -> Result<(), SchemaInferenceError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    for (row, cells) in rows.iter().enumerate() {
        let cell = cells.as_ref()[col].as_ref();
        if !is_null_token(cell) && !column_type.accepts(cell) {
            return Err(SchemaInferenceError::TypeMismatch {
                column: name.to_string(),
                row,
                value: cell.to_string(),
                expected: column_type,
            });
        }
    }
    Ok(())
}
