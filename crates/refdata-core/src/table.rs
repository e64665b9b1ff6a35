//! Immutable columnar reference table.
//!
//! Numeric columns are dense `Vec`s, boolean columns are packed bits, and all
//! text columns share one UTF-8 blob addressed through an offset table. Text
//! cells are appended row-major (every text column of row 0, then row 1, ...),
//! so text cell `k = row * text_columns + ordinal` spans
//! `offsets[k]..offsets[k + 1]`. Null cells store a zero / `false` / empty
//! placeholder and are told apart only through the column's validity mask.

use crate::bitmask::Bitmask;
use crate::row::{FieldValue, RowView};
use crate::schema::{check_shape, ColumnSpec, SchemaInferenceError, TableSchema};
use crate::types::{is_null_token, parse_bool, parse_float, parse_int, ColumnType};

#[derive(Debug, Clone)]
enum ColumnValues {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Bitmask),
    /// Position of this column among the table's text columns
    Text { ordinal: usize },
}

#[derive(Debug, Clone)]
struct Column {
    values: ColumnValues,
    /// `None` when the column has no nulls
    validity: Option<Bitmask>,
}

/// A frozen reference table in columnar layout.
///
/// Built once from text rows and never mutated; share it by reference (or
/// behind an `Arc`) across sampling threads.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    schema: TableSchema,
    columns: Vec<Column>,
    row_count: usize,
    text_columns: usize,
    blob: String,
    offsets: Vec<usize>,
}

impl ReferenceTable {
    /// Build a table from raw text rows, converting every cell to the type the
    /// schema assigns to its column.
    pub fn build<R, S>(rows: &[R], schema: &TableSchema) -> Result<Self, SchemaInferenceError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if schema.is_empty() && !rows.is_empty() {
            return Err(SchemaInferenceError::NoColumns { rows: rows.len() });
        }
        check_shape(rows, schema.len())?;

        let row_count = rows.len();
        let text_columns = schema.text_column_count();

        let mut ordinal = 0;
        let mut builders: Vec<ColumnBuilder<'_>> = schema
            .columns()
            .iter()
            .map(|spec| {
                let values = match spec.column_type {
                    ColumnType::Int64 => ColumnValues::Int64(Vec::with_capacity(row_count)),
                    ColumnType::Float64 => ColumnValues::Float64(Vec::with_capacity(row_count)),
                    ColumnType::Bool => ColumnValues::Bool(Bitmask::with_capacity(row_count)),
                    ColumnType::Utf8Text => {
                        ordinal += 1;
                        ColumnValues::Text {
                            ordinal: ordinal - 1,
                        }
                    }
                };
                ColumnBuilder {
                    spec,
                    values,
                    validity: Bitmask::with_capacity(row_count),
                }
            })
            .collect();

        let mut blob = String::new();
        let mut offsets = Vec::with_capacity(row_count * text_columns + 1);
        offsets.push(0);

        for (row, cells) in rows.iter().enumerate() {
            for (builder, cell) in builders.iter_mut().zip(cells.as_ref()) {
                builder.push(row, cell.as_ref(), &mut blob, &mut offsets)?;
            }
        }

        let columns: Vec<Column> = builders.into_iter().map(ColumnBuilder::finish).collect();
        let table = Self {
            schema: schema.clone(),
            columns,
            row_count,
            text_columns,
            blob,
            offsets,
        };

        tracing::debug!(
            "Built reference table: {} rows, {} columns ({} text), {} blob bytes",
            table.row_count,
            table.columns.len(),
            table.text_columns,
            table.blob.len()
        );

        Ok(table)
    }

    /// Infer the schema from the rows and build the table in one step.
    pub fn from_rows<N, R, S>(column_names: &[N], rows: &[R]) -> Result<Self, SchemaInferenceError>
    where
        N: AsRef<str>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let schema = TableSchema::infer(column_names, rows)?;
        Self::build(rows, &schema)
    }

    /// The table schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.schema.columns().iter().map(|c| c.name.as_str())
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    /// Spec of the column at `col`.
    pub fn column_spec(&self, col: usize) -> Option<&ColumnSpec> {
        self.schema.columns().get(col)
    }

    /// Storage type of the column at `col`.
    pub fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.column_spec(col).map(|c| c.column_type)
    }

    /// Number of nulls in the column at `col`.
    pub fn null_count(&self, col: usize) -> usize {
        self.columns
            .get(col)
            .and_then(|c| c.validity.as_ref())
            .map_or(0, Bitmask::count_zeros)
    }

    /// Size of the shared text blob in bytes.
    pub fn text_bytes(&self) -> usize {
        self.blob.len()
    }

    /// Approximate heap footprint of all column buffers.
    pub fn heap_bytes(&self) -> usize {
        let columns: usize = self
            .columns
            .iter()
            .map(|c| {
                let values = match &c.values {
                    ColumnValues::Int64(v) => v.len() * std::mem::size_of::<i64>(),
                    ColumnValues::Float64(v) => v.len() * std::mem::size_of::<f64>(),
                    ColumnValues::Bool(bits) => bits.byte_len(),
                    ColumnValues::Text { .. } => 0,
                };
                values + c.validity.as_ref().map_or(0, Bitmask::byte_len)
            })
            .sum();
        columns + self.blob.len() + self.offsets.len() * std::mem::size_of::<usize>()
    }

    /// Borrow row `row`, or `None` past the end of the table.
    #[inline]
    pub fn row(&self, row: usize) -> Option<RowView<'_>> {
        (row < self.row_count).then(|| RowView::new(self, row))
    }

    /// Iterate over all rows in table order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'_>> + '_ {
        (0..self.row_count).map(move |row| RowView::new(self, row))
    }

    /// Whether the cell is null. Out-of-range cells are not null.
    #[inline]
    pub fn is_null(&self, row: usize, col: usize) -> bool {
        if row >= self.row_count {
            return false;
        }
        self.columns
            .get(col)
            .and_then(|c| c.validity.as_ref())
            .is_some_and(|mask| !mask.get(row))
    }

    /// Integer cell, `None` when null, out of range or not an `Int64` column.
    #[inline]
    pub fn get_int(&self, row: usize, col: usize) -> Option<i64> {
        match &self.live_column(row, col)?.values {
            ColumnValues::Int64(values) => values.get(row).copied(),
            _ => None,
        }
    }

    /// Float cell, `None` when null, out of range or not a `Float64` column.
    #[inline]
    pub fn get_float(&self, row: usize, col: usize) -> Option<f64> {
        match &self.live_column(row, col)?.values {
            ColumnValues::Float64(values) => values.get(row).copied(),
            _ => None,
        }
    }

    /// Boolean cell, `None` when null, out of range or not a `Bool` column.
    #[inline]
    pub fn get_bool(&self, row: usize, col: usize) -> Option<bool> {
        match &self.live_column(row, col)?.values {
            ColumnValues::Bool(bits) => Some(bits.get(row)),
            _ => None,
        }
    }

    /// Text cell sliced from the blob, `None` when null, out of range or not
    /// a `Utf8Text` column.
    #[inline]
    pub fn get_text(&self, row: usize, col: usize) -> Option<&str> {
        match self.live_column(row, col)?.values {
            ColumnValues::Text { ordinal } => {
                let cell = row * self.text_columns + ordinal;
                let (start, end) = (self.offsets[cell], self.offsets[cell + 1]);
                Some(&self.blob[start..end])
            }
            _ => None,
        }
    }

    /// Numeric cell widened to `f64` (`Int64` or `Float64` columns).
    #[inline]
    pub fn get_numeric(&self, row: usize, col: usize) -> Option<f64> {
        self.get_float(row, col)
            .or_else(|| self.get_int(row, col).map(|v| v as f64))
    }

    /// Typed cell value.
    pub fn value(&self, row: usize, col: usize) -> FieldValue<'_> {
        let Some(column) = self.live_column(row, col) else {
            return FieldValue::Null;
        };
        match column.values {
            ColumnValues::Int64(_) => self
                .get_int(row, col)
                .map_or(FieldValue::Null, FieldValue::Int),
            ColumnValues::Float64(_) => self
                .get_float(row, col)
                .map_or(FieldValue::Null, FieldValue::Float),
            ColumnValues::Bool(_) => self
                .get_bool(row, col)
                .map_or(FieldValue::Null, FieldValue::Bool),
            ColumnValues::Text { .. } => self
                .get_text(row, col)
                .map_or(FieldValue::Null, FieldValue::Text),
        }
    }

    /// The column at `col` if `(row, col)` is in range and not null.
    #[inline]
    fn live_column(&self, row: usize, col: usize) -> Option<&Column> {
        if row >= self.row_count || self.is_null(row, col) {
            return None;
        }
        self.columns.get(col)
    }
}

struct ColumnBuilder<'s> {
    spec: &'s ColumnSpec,
    values: ColumnValues,
    validity: Bitmask,
}

impl ColumnBuilder<'_> {
    fn push(
        &mut self,
        row: usize,
        cell: &str,
        blob: &mut String,
        offsets: &mut Vec<usize>,
    ) -> Result<(), SchemaInferenceError> {
        let spec = self.spec;
        let null = is_null_token(cell);
        self.validity.push(!null);

        match &mut self.values {
            ColumnValues::Int64(values) => {
                let value = if null {
                    0
                } else {
                    parse_cell(spec, row, cell, parse_int)?
                };
                values.push(value);
            }
            ColumnValues::Float64(values) => {
                let value = if null {
                    0.0
                } else {
                    parse_cell(spec, row, cell, parse_float)?
                };
                values.push(value);
            }
            ColumnValues::Bool(bits) => {
                let value = if null {
                    false
                } else {
                    parse_cell(spec, row, cell, parse_bool)?
                };
                bits.push(value);
            }
            ColumnValues::Text { .. } => {
                if !null {
                    blob.push_str(cell);
                }
                offsets.push(blob.len());
            }
        }
        Ok(())
    }

    fn finish(self) -> Column {
        let validity = (!self.validity.all_set()).then_some(self.validity);
        Column {
            values: self.values,
            validity,
        }
    }
}

fn parse_cell<T>(
    spec: &ColumnSpec,
    row: usize,
    cell: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, SchemaInferenceError> {
    parse(cell).ok_or_else(|| SchemaInferenceError::TypeMismatch {
        column: spec.name.clone(),
        row,
        value: cell.to_string(),
        expected: spec.column_type,
    })
}
