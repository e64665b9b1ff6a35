//! Columnar storage for synthref reference tables.
//!
//! A reference table is a frozen, pre-aggregated dataset (drug names, lab
//! codes, diagnosis codes, ...) annotated with observation counts. This crate
//! turns the raw text rows handed over by a loader into compact columnar
//! buffers:
//!
//! - [`TableSchema`] - Column names plus inferred (or pinned) [`ColumnType`]s
//! - [`ReferenceTable`] - Typed column arrays, null masks and one shared text blob
//! - [`RowView`] - Borrowed, allocation-free view of a single row
//! - [`FieldValue`] - A single cell, borrowing text from the table
//!
//! # Architecture
//!
//! ```text
//! (column names, text rows)
//!          │
//!          ▼
//!   TableSchema::infer
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │   ReferenceTable    │
//! │                     │
//! │  - Int64/Float64    │
//! │  - Bool (packed)    │
//! │  - null masks       │
//! │  - text blob+offsets│
//! └─────────┬───────────┘
//!           │ row(i)
//!           ▼
//!     RowView<'table>
//! ```
//!
//! # Example
//!
//! ```rust
//! use refdata_core::{ReferenceTable, TableSchema};
//!
//! let names = ["code", "count", "label"];
//! let rows = vec![
//!     vec!["A01", "12", "Cholera"],
//!     vec!["A02", "NULL", ""],
//! ];
//!
//! let schema = TableSchema::infer(&names, &rows).unwrap();
//! let table = ReferenceTable::build(&rows, &schema).unwrap();
//!
//! let row = table.row(0).unwrap();
//! assert_eq!(row.get_text(0), Some("A01"));
//! assert_eq!(row.get_int(1), Some(12));
//! assert!(table.row(1).unwrap().is_null(1));
//! ```

pub mod bitmask;
pub mod row;
pub mod schema;
pub mod table;
pub mod types;

// Re-exports for convenience
pub use bitmask::Bitmask;
pub use row::{FieldValue, RowView};
pub use schema::{ColumnSpec, SchemaInferenceError, TableSchema};
pub use table::ReferenceTable;
pub use types::ColumnType;
