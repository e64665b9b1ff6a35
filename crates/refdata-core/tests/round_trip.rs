//! Raw rows in, typed values out.

use refdata_core::{ColumnType, FieldValue, ReferenceTable, TableSchema};

const NAMES: [&str; 3] = ["a", "b", "c"];

fn source_rows() -> Vec<Vec<&'static str>> {
    vec![vec!["", "NULL", "Hello"], vec!["x", "1", "2.5"]]
}

#[test]
fn test_round_trip_returns_original_non_null_values() {
    let rows = source_rows();
    let schema = TableSchema::infer(&NAMES, &rows).unwrap();
    let table = ReferenceTable::build(&rows, &schema).unwrap();

    let types: Vec<_> = schema.columns().iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![ColumnType::Utf8Text, ColumnType::Int64, ColumnType::Utf8Text]
    );

    for (i, source) in rows.iter().enumerate() {
        let row = table.row(i).unwrap();
        for (col, token) in source.iter().enumerate() {
            let null = token.is_empty() || *token == "NULL";
            assert_eq!(row.is_null(col), null, "row {i} col {col}");
            if null {
                assert_eq!(row.value(col), FieldValue::Null);
            } else {
                assert_eq!(row.value(col).to_string(), *token, "row {i} col {col}");
            }
        }
    }

    let last = table.row(1).unwrap();
    assert_eq!(last.get_text(0), Some("x"));
    assert_eq!(last.get_int(1), Some(1));
    assert_eq!(last.get_text(2), Some("2.5"));
}

#[test]
fn test_empty_string_and_null_share_the_blob_representation() {
    let rows = vec![vec!["", "kept"], vec!["NULL", "also kept"]];
    let table = ReferenceTable::from_rows(&["maybe", "text"], &rows).unwrap();

    // neither null form occupies blob space
    assert_eq!(table.text_bytes(), "kept".len() + "also kept".len());
    assert!(table.row(0).unwrap().is_null(0));
    assert!(table.row(1).unwrap().is_null(0));
    assert_eq!(table.row(1).unwrap().get_text(1), Some("also kept"));
}

#[test]
fn test_many_text_columns_stay_aligned() {
    let rows: Vec<Vec<String>> = (0..500)
        .map(|i| {
            vec![
                format!("code-{i}"),
                if i % 7 == 0 { String::new() } else { format!("name {i}") },
                i.to_string(),
                format!("desc-{}", "z".repeat(i % 13)),
            ]
        })
        .collect();

    let table = ReferenceTable::from_rows(&["code", "name", "count", "desc"], &rows).unwrap();
    assert_eq!(table.column_type(2), Some(ColumnType::Int64));

    for row in table.rows() {
        let i = row.index();
        assert_eq!(row.get_text(0), Some(format!("code-{i}").as_str()));
        if i % 7 == 0 {
            assert!(row.is_null(1));
        } else {
            assert_eq!(row.get_text(1), Some(format!("name {i}").as_str()));
        }
        assert_eq!(row.get_int(2), Some(i as i64));
        assert_eq!(row.get_text(3).map(str::len), Some(5 + i % 13));
    }
}
