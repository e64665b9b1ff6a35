//! Reference table loading.
//!
//! CSV files are read with the `csv` crate into plain text rows; everything
//! after that (type inference, columnar layout, index construction) belongs
//! to `refdata-core` and `refdata-sampler`.

use crate::config::DatasetConfig;
use anyhow::Context;
use refdata_core::{ReferenceTable, TableSchema};
use refdata_sampler::Dataset;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Header names plus text cells of a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header row
    pub column_names: Vec<String>,
    /// Data rows, one cell per column
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> anyhow::Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open reference table {}", path.display()))?;
    read_csv_from(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read CSV data with a header row from any reader.
pub fn read_csv_from<R: Read>(reader: R) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let column_names: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(RawTable { column_names, rows })
}

/// Build the columnar table for a dataset from raw rows.
pub fn build_table(config: &DatasetConfig, raw: &RawTable) -> anyhow::Result<ReferenceTable> {
    let schema = TableSchema::infer_with_pins(&raw.column_names, &raw.rows, &config.columns)
        .with_context(|| format!("Failed to infer schema of dataset '{}'", config.name))?;
    debug!("Dataset '{}' schema: {}", config.name, schema.describe());

    ReferenceTable::build(&raw.rows, &schema)
        .with_context(|| format!("Failed to build table of dataset '{}'", config.name))
}

/// Build a dataset (table and indices) from raw rows.
pub fn build_dataset(config: &DatasetConfig, raw: &RawTable) -> anyhow::Result<Dataset> {
    let table = build_table(config, raw)?;

    let mut builder = Dataset::builder(&config.name, table, &config.weight_column)
        .index_order(config.index_order);
    if let Some(window) = &config.time_window {
        builder = builder.time_window(window.spec.clone(), window.bucket_range()?);
    }

    builder
        .build()
        .with_context(|| format!("Failed to build indices of dataset '{}'", config.name))
}

/// Read a dataset's CSV file and build it.
pub fn load_dataset(config: &DatasetConfig) -> anyhow::Result<Dataset> {
    let start = Instant::now();
    let raw = read_csv(&config.path)?;
    let dataset = build_dataset(config, &raw)?;

    info!(
        "Loaded dataset '{}' from {} ({} rows) in {:?}",
        config.name,
        config.path.display(),
        raw.rows.len(),
        start.elapsed()
    );
    Ok(dataset)
}
