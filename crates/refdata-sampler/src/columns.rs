//! Column helpers shared by the index builders.

use crate::error::SamplingError;
use refdata_core::{FieldValue, ReferenceTable};

/// Position of a named column.
pub fn resolve_column(table: &ReferenceTable, name: &str) -> Result<usize, SamplingError> {
    table
        .column_index(name)
        .ok_or_else(|| SamplingError::UnknownColumn(name.to_string()))
}

/// Weight of every row of `column`, in table order.
///
/// Each cell must be a non-null, non-negative integer (an `Int64` value, or a
/// text cell that parses as one). Anything else fails the whole build.
pub fn column_weights(table: &ReferenceTable, column: &str) -> Result<Vec<u64>, SamplingError> {
    let col = resolve_column(table, column)?;
    (0..table.row_count())
        .map(|row| weight_at(table, column, col, row))
        .collect()
}

fn weight_at(
    table: &ReferenceTable,
    column: &str,
    col: usize,
    row: usize,
) -> Result<u64, SamplingError> {
    let value = table.value(row, col);
    let weight = match (value.as_i64(), value.as_str()) {
        (Some(v), _) => u64::try_from(v).ok(),
        (_, Some(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    weight.ok_or_else(|| SamplingError::InvalidWeight {
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}

/// Category key of a row: the cell's text form, or `""` without a category
/// column. Null cells map to `""` as well.
pub(crate) fn category_key(table: &ReferenceTable, row: usize, col: Option<usize>) -> String {
    match col.map(|col| table.value(row, col)) {
        None | Some(FieldValue::Null) => String::new(),
        Some(value) => value.as_str().map_or_else(|| value.to_string(), str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_weights() {
        let rows = vec![vec!["a", "5"], vec!["b", "0"], vec!["c", "15"]];
        let table = ReferenceTable::from_rows(&["code", "count"], &rows).unwrap();
        assert_eq!(column_weights(&table, "count").unwrap(), vec![5, 0, 15]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let rows = vec![vec!["a", "5"], vec!["b", "-1"]];
        let table = ReferenceTable::from_rows(&["code", "count"], &rows).unwrap();
        assert_eq!(
            column_weights(&table, "count").unwrap_err(),
            SamplingError::InvalidWeight {
                column: "count".into(),
                row: 1,
                value: "-1".into()
            }
        );
    }

    #[test]
    fn test_null_and_malformed_weights_rejected() {
        let rows = vec![vec!["a", "NULL"]];
        let table = ReferenceTable::from_rows(&["code", "count"], &rows).unwrap();
        assert!(matches!(
            column_weights(&table, "count"),
            Err(SamplingError::InvalidWeight { row: 0, .. })
        ));

        let rows = vec![vec!["a", "3"], vec!["b", "many"]];
        let table = ReferenceTable::from_rows(&["code", "count"], &rows).unwrap();
        assert!(matches!(
            column_weights(&table, "count"),
            Err(SamplingError::InvalidWeight { row: 1, ref value, .. }) if value == "many"
        ));

        let rows = vec![vec!["a", "2.5"]];
        let table = ReferenceTable::from_rows(&["code", "count"], &rows).unwrap();
        assert!(column_weights(&table, "count").is_err());
    }

    #[test]
    fn test_unknown_column() {
        let rows = vec![vec!["a"]];
        let table = ReferenceTable::from_rows(&["code"], &rows).unwrap();
        assert_eq!(
            column_weights(&table, "count").unwrap_err(),
            SamplingError::UnknownColumn("count".into())
        );
    }

    #[test]
    fn test_category_key() {
        let rows = vec![vec!["M", "1"], vec!["NULL", "2"]];
        let table = ReferenceTable::from_rows(&["sex", "year"], &rows).unwrap();
        assert_eq!(category_key(&table, 0, Some(0)), "M");
        assert_eq!(category_key(&table, 1, Some(0)), "");
        assert_eq!(category_key(&table, 1, Some(1)), "2");
        assert_eq!(category_key(&table, 0, None), "");
    }
}
