//! Borrowed row and cell views.

use crate::table::ReferenceTable;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell, borrowing text from the table's blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue<'a> {
    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Boolean value
    Bool(bool),

    /// Text slice of the shared blob
    Text(&'a str),

    /// Null value
    Null,
}

impl<'a> FieldValue<'a> {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Null => f.write_str(crate::types::NULL_TOKEN),
        }
    }
}

/// Read-only view of one row of a [`ReferenceTable`].
///
/// Constructing a view costs nothing; every accessor reads straight from the
/// column buffers.
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    table: &'a ReferenceTable,
    row: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(table: &'a ReferenceTable, row: usize) -> Self {
        Self { table, row }
    }

    /// Row position in the table.
    pub fn index(&self) -> usize {
        self.row
    }

    /// The table this row belongs to.
    pub fn table(&self) -> &'a ReferenceTable {
        self.table
    }

    /// Whether the cell at `col` is null.
    pub fn is_null(&self, col: usize) -> bool {
        self.table.is_null(self.row, col)
    }

    /// Integer cell at `col`.
    pub fn get_int(&self, col: usize) -> Option<i64> {
        self.table.get_int(self.row, col)
    }

    /// Float cell at `col`.
    pub fn get_float(&self, col: usize) -> Option<f64> {
        self.table.get_float(self.row, col)
    }

    /// Boolean cell at `col`.
    pub fn get_bool(&self, col: usize) -> Option<bool> {
        self.table.get_bool(self.row, col)
    }

    /// Text cell at `col`.
    pub fn get_text(&self, col: usize) -> Option<&'a str> {
        self.table.get_text(self.row, col)
    }

    /// Numeric cell at `col`, widened to `f64`.
    pub fn get_numeric(&self, col: usize) -> Option<f64> {
        self.table.get_numeric(self.row, col)
    }

    /// Typed cell at `col`.
    pub fn value(&self, col: usize) -> FieldValue<'a> {
        self.table.value(self.row, col)
    }

    /// Typed cell by column name; `None` if the column does not exist.
    pub fn get_by_name(&self, name: &str) -> Option<FieldValue<'a>> {
        self.table.column_index(name).map(|col| self.value(col))
    }

    /// `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, FieldValue<'a>)> + '_ {
        let table = self.table;
        table
            .column_names()
            .enumerate()
            .map(move |(col, name)| (name, table.value(self.row, col)))
    }
}

impl fmt::Debug for RowView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Serializes as a map of column name to value.
impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
