//! Error types for index construction and sampling.

use thiserror::Error;

/// Errors raised while building or sampling a distribution.
///
/// Build-time variants describe defects in the reference data and are never
/// worth retrying; sample-time variants are deterministic for a given draw.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// A named column does not exist in the table
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A weight cell is not a non-negative integer
    #[error("Invalid weight in column '{column}' row {row}: '{value}'")]
    InvalidWeight {
        column: String,
        row: usize,
        value: String,
    },

    /// The running weight sum does not fit in a u64
    #[error("Total weight overflows at row {row}")]
    WeightOverflow { row: usize },

    /// A mean or standard deviation cell cannot define a time window
    #[error("Invalid statistic in column '{column}' row {row}: '{value}'")]
    InvalidStatistic {
        column: String,
        row: usize,
        value: String,
    },

    /// The bucket range is inverted or too wide
    #[error("Invalid bucket range [{min}, {max}]")]
    InvalidBucketRange { min: i64, max: i64 },

    /// The window half-width `k` is negative or not finite
    #[error("Invalid window width k = {0}")]
    InvalidWindowWidth(f64),

    /// Sampling attempted on a distribution whose total weight is zero
    #[error("Cannot sample from an empty distribution")]
    EmptyDistribution,

    /// A draw outside `[0, total)`
    #[error("Draw {draw} out of range for total weight {total}")]
    IndexOutOfRange { draw: u64, total: u64 },

    /// An index entry points past the end of the table
    #[error("Row {row} out of range for table with {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },

    /// Bucket sampling requested on a dataset built without a time window
    #[error("Dataset '{0}' has no time window")]
    NotTimeWindowed(String),
}
