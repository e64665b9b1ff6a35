//! Time-windowed distribution.
//!
//! Each row carries the mean and standard deviation of the buckets it was
//! observed in. Its appearance window is
//! `[round(mean - k * stddev), round(mean + k * stddev)]`, clipped to the
//! distribution's [`BucketRange`]; the row is registered in every bucket of
//! the clipped window under its category, and one
//! [`WeightedCumulativeIndex`] is built per `(category, bucket)` from the
//! rows' original weights.

use crate::bucket::BucketRange;
use crate::columns::{category_key, column_weights, resolve_column};
use crate::error::SamplingError;
use crate::index::{WeightedCumulativeIndex, EMPTY_INDEX};
use rand::Rng;
use refdata_core::{FieldValue, ReferenceTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default window half-width in standard deviations.
pub const DEFAULT_WINDOW_K: f64 = 2.0;

fn default_k() -> f64 {
    DEFAULT_WINDOW_K
}

/// Columns and width defining the appearance windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Column partitioning rows into independent distributions
    #[serde(default)]
    pub category_column: Option<String>,

    /// Column holding each row's mean bucket
    pub mean_column: String,

    /// Column holding each row's bucket standard deviation
    pub stddev_column: String,

    /// Window half-width in standard deviations
    #[serde(default = "default_k")]
    pub k: f64,
}

impl WindowSpec {
    /// Create a spec without a category column and the default `k`.
    pub fn new(mean_column: impl Into<String>, stddev_column: impl Into<String>) -> Self {
        Self {
            category_column: None,
            mean_column: mean_column.into(),
            stddev_column: stddev_column.into(),
            k: DEFAULT_WINDOW_K,
        }
    }

    /// Partition rows by `column`.
    pub fn with_category(mut self, column: impl Into<String>) -> Self {
        self.category_column = Some(column.into());
        self
    }

    /// Override the window half-width.
    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }
}

/// Appearance window of a row, clipped to `range`, or `None` when it falls
/// entirely outside.
pub fn appearance_window(
    mean: f64,
    stddev: f64,
    k: f64,
    range: &BucketRange,
) -> Option<(i64, i64)> {
    // float-to-int casts saturate, so extreme windows still clip correctly
    let lo = (mean - k * stddev).round() as i64;
    let hi = (mean + k * stddev).round() as i64;
    range.clip(lo, hi)
}

/// Per-`(category, bucket)` weighted indices.
#[derive(Debug, Clone)]
pub struct TimeWindowedDistribution {
    range: BucketRange,
    k: f64,
    /// Per category, one index per bucket of `range`, in bucket order
    categories: HashMap<String, Vec<WeightedCumulativeIndex>>,
}

impl TimeWindowedDistribution {
    /// Build the distribution from `table`.
    ///
    /// Rows with a null mean are registered nowhere; a null stddev counts as
    /// zero. A negative or non-numeric statistic fails the build.
    pub fn build(
        table: &ReferenceTable,
        weight_column: &str,
        spec: &WindowSpec,
        range: BucketRange,
    ) -> Result<Self, SamplingError> {
        if !spec.k.is_finite() || spec.k < 0.0 {
            return Err(SamplingError::InvalidWindowWidth(spec.k));
        }

        let weights = column_weights(table, weight_column)?;
        let category_col = spec
            .category_column
            .as_deref()
            .map(|name| resolve_column(table, name))
            .transpose()?;
        let mean_col = resolve_column(table, &spec.mean_column)?;
        let stddev_col = resolve_column(table, &spec.stddev_column)?;

        let mut registered: HashMap<String, Vec<Vec<(usize, u64)>>> = HashMap::new();
        let mut registrations = 0usize;

        for (row, weight) in weights.into_iter().enumerate() {
            let mean = match table.value(row, mean_col) {
                FieldValue::Null => None,
                value => Some(statistic(value, &spec.mean_column, row)?),
            };
            let stddev = match table.value(row, stddev_col) {
                FieldValue::Null => 0.0,
                value => statistic(value, &spec.stddev_column, row)?,
            };
            if stddev < 0.0 {
                return Err(SamplingError::InvalidStatistic {
                    column: spec.stddev_column.clone(),
                    row,
                    value: stddev.to_string(),
                });
            }

            let Some(mean) = mean else { continue };
            if weight == 0 {
                continue;
            }
            let Some((lo, hi)) = appearance_window(mean, stddev, spec.k, &range) else {
                continue;
            };

            let buckets = registered
                .entry(category_key(table, row, category_col))
                .or_insert_with(|| vec![Vec::new(); range.len()]);
            for bucket in lo..=hi {
                buckets[(bucket - range.min) as usize].push((row, weight));
            }
            registrations += (hi - lo) as usize + 1;
        }

        let categories = registered
            .into_iter()
            .map(|(category, buckets)| {
                buckets
                    .into_iter()
                    .map(WeightedCumulativeIndex::from_weights)
                    .collect::<Result<Vec<_>, _>>()
                    .map(|indices| (category, indices))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        if categories.is_empty() && table.row_count() > 0 {
            tracing::warn!(
                "No row of {} has a window inside buckets [{}, {}]; every bucket is empty",
                table.row_count(),
                range.min,
                range.max
            );
        }
        tracing::debug!(
            "Built time-windowed distribution: {} categories, {} buckets, {} registrations",
            categories.len(),
            range.len(),
            registrations
        );

        Ok(Self {
            range,
            k: spec.k,
            categories,
        })
    }

    /// Index of `(category, bucket)`. Unknown categories and buckets outside
    /// the range yield an index with zero total weight.
    pub fn index_for(&self, category: &str, bucket: i64) -> &WeightedCumulativeIndex {
        self.range
            .offset(bucket)
            .and_then(|offset| self.categories.get(category)?.get(offset))
            .unwrap_or(&EMPTY_INDEX)
    }

    /// Row selected by `draw` within `(category, bucket)`.
    ///
    /// An empty bucket is reported as [`SamplingError::EmptyDistribution`];
    /// falling back to an unconditioned index is the caller's decision.
    pub fn sample_for_bucket(
        &self,
        category: &str,
        bucket: i64,
        draw: u64,
    ) -> Result<usize, SamplingError> {
        self.index_for(category, bucket).sample(draw)
    }

    /// Like [`sample_for_bucket`](Self::sample_for_bucket) with a draw taken
    /// from `rng`.
    pub fn sample_for_bucket_with<R: Rng + ?Sized>(
        &self,
        category: &str,
        bucket: i64,
        rng: &mut R,
    ) -> Result<usize, SamplingError> {
        self.index_for(category, bucket).sample_with(rng)
    }

    /// Category keys with at least one registered row.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.keys().map(String::as_str)
    }

    /// Number of non-empty buckets of `category`.
    pub fn covered_buckets(&self, category: &str) -> usize {
        self.categories
            .get(category)
            .map_or(0, |buckets| buckets.iter().filter(|i| !i.is_empty()).count())
    }

    /// Bucket range the distribution was built over.
    pub fn bucket_range(&self) -> BucketRange {
        self.range
    }

    /// Window half-width in standard deviations.
    pub fn k(&self) -> f64 {
        self.k
    }
}

fn statistic(value: FieldValue<'_>, column: &str, row: usize) -> Result<f64, SamplingError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SamplingError::InvalidStatistic {
            column: column.to_string(),
            row,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 5]]) -> ReferenceTable {
        ReferenceTable::from_rows(&["code", "sex", "count", "mean", "sd"], rows).unwrap()
    }

    fn spec() -> WindowSpec {
        WindowSpec::new("mean", "sd").with_category("sex")
    }

    #[test]
    fn test_window_example() {
        let range = BucketRange::new(0, 300).unwrap();
        assert_eq!(appearance_window(100.0, 10.0, 2.0, &range), Some((80, 120)));

        let t = table(&[["X1", "F", "4", "100", "10"]]);
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();

        for bucket in 0..=300 {
            let total = dist.index_for("F", bucket).total_weight();
            if (80..=120).contains(&bucket) {
                assert_eq!(total, 4, "bucket {bucket}");
            } else {
                assert_eq!(total, 0, "bucket {bucket}");
            }
        }
        assert_eq!(dist.covered_buckets("F"), 41);
    }

    #[test]
    fn test_window_clipped_to_range() {
        let range = BucketRange::new(90, 110).unwrap();
        assert_eq!(appearance_window(100.0, 10.0, 2.0, &range), Some((90, 110)));
        assert_eq!(appearance_window(200.0, 10.0, 2.0, &range), None);
        assert_eq!(appearance_window(60.0, 10.0, 2.0, &range), None);
        assert_eq!(appearance_window(75.0, 10.0, 2.0, &range), Some((90, 95)));
    }

    #[test]
    fn test_rounding() {
        let range = BucketRange::new(-100, 100).unwrap();
        assert_eq!(appearance_window(10.25, 1.5, 2.0, &range), Some((7, 13)));
        assert_eq!(appearance_window(10.0, 0.25, 2.0, &range), Some((10, 11)));
        assert_eq!(appearance_window(-10.0, 0.25, 2.0, &range), Some((-11, -10)));
    }

    #[test]
    fn test_widening_k_only_adds_buckets() {
        let range = BucketRange::new(0, 200).unwrap();
        for (mean, sd) in [(100.0, 10.0), (3.4, 7.7), (190.5, 0.3), (0.0, 0.0)] {
            let (lo1, hi1) = appearance_window(mean, sd, 1.0, &range).unwrap();
            let (lo2, hi2) = appearance_window(mean, sd, 2.0, &range).unwrap();
            assert!(lo2 <= lo1 && hi1 <= hi2, "mean {mean} sd {sd}");
        }
    }

    #[test]
    fn test_categories_are_independent() {
        let t = table(&[
            ["A", "F", "2", "10", "1"],
            ["B", "M", "3", "10", "1"],
            ["C", "F", "5", "12", "0"],
        ]);
        let range = BucketRange::new(0, 20).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();

        assert_eq!(dist.index_for("F", 12).rows(), &[0, 2]);
        assert_eq!(dist.index_for("F", 12).total_weight(), 7);
        assert!(dist.index_for("F", 13).is_empty());
        assert_eq!(dist.index_for("M", 12).rows(), &[1]);
        assert_eq!(dist.index_for("X", 12).total_weight(), 0);
        assert_eq!(dist.index_for("F", 99).total_weight(), 0);

        let mut categories: Vec<_> = dist.categories().collect();
        categories.sort();
        assert_eq!(categories, vec!["F", "M"]);
    }

    #[test]
    fn test_sample_for_bucket() {
        let t = table(&[["A", "F", "2", "10", "1"], ["C", "F", "5", "12", "0"]]);
        let range = BucketRange::new(0, 20).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();

        assert_eq!(dist.sample_for_bucket("F", 12, 1).unwrap(), 0);
        assert_eq!(dist.sample_for_bucket("F", 12, 2).unwrap(), 1);
        assert_eq!(dist.sample_for_bucket("F", 9, 0).unwrap(), 0);
        assert_eq!(
            dist.sample_for_bucket("F", 13, 0).unwrap_err(),
            SamplingError::EmptyDistribution
        );
    }

    #[test]
    fn test_null_statistics() {
        let t = table(&[["A", "F", "2", "NULL", "1"], ["B", "F", "3", "10", "NULL"]]);
        let range = BucketRange::new(0, 20).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();

        // null mean: nowhere; null sd: exactly the mean bucket
        assert_eq!(dist.covered_buckets("F"), 1);
        assert_eq!(dist.index_for("F", 10).rows(), &[1]);
    }

    #[test]
    fn test_negative_stddev_rejected() {
        let t = table(&[["A", "F", "2", "10", "-1"]]);
        let range = BucketRange::new(0, 20).unwrap();
        let err = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap_err();
        assert!(matches!(err, SamplingError::InvalidStatistic { row: 0, .. }));
    }

    #[test]
    fn test_invalid_window_width_rejected() {
        let t = table(&[["A", "F", "2", "10", "1"]]);
        let range = BucketRange::new(0, 20).unwrap();

        for k in [-1.0, f64::INFINITY, f64::NEG_INFINITY] {
            let err = TimeWindowedDistribution::build(&t, "count", &spec().with_k(k), range)
                .unwrap_err();
            assert_eq!(err, SamplingError::InvalidWindowWidth(k));
        }

        let err = TimeWindowedDistribution::build(&t, "count", &spec().with_k(f64::NAN), range)
            .unwrap_err();
        assert!(matches!(err, SamplingError::InvalidWindowWidth(k) if k.is_nan()));

        // zero width is a point window
        let dist =
            TimeWindowedDistribution::build(&t, "count", &spec().with_k(0.0), range).unwrap();
        assert_eq!(dist.covered_buckets("F"), 1);
    }

    #[test]
    fn test_non_numeric_statistics_rejected() {
        let t = table(&[["A", "F", "2", "soon", "1"]]);
        let range = BucketRange::new(0, 20).unwrap();
        let err = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap_err();
        assert_eq!(
            err,
            SamplingError::InvalidStatistic {
                column: "mean".into(),
                row: 0,
                value: "soon".into()
            }
        );

        let t = table(&[["A", "F", "2", "10", "wide"]]);
        let err = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap_err();
        assert_eq!(
            err,
            SamplingError::InvalidStatistic {
                column: "sd".into(),
                row: 0,
                value: "wide".into()
            }
        );

        let t = table(&[["A", "F", "2", "true", "1"]]);
        let err = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap_err();
        assert!(matches!(err, SamplingError::InvalidStatistic { row: 0, .. }));
    }

    #[test]
    fn test_sample_for_bucket_with_rng() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let t = table(&[
            ["A", "F", "2", "10", "1"],
            ["B", "F", "7", "15", "1"],
            ["C", "F", "5", "12", "0"],
        ]);
        let range = BucketRange::new(0, 20).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        // bucket 12 is covered by A (8..=12) and C (12) only
        let mut seen = [0usize; 3];
        for _ in 0..500 {
            let row = dist.sample_for_bucket_with("F", 12, &mut rng).unwrap();
            seen[row] += 1;
        }
        assert_eq!(seen[1], 0);
        assert!(seen[0] > 0 && seen[2] > 0);

        assert_eq!(
            dist.sample_for_bucket_with("F", 20, &mut rng).unwrap_err(),
            SamplingError::EmptyDistribution
        );
        assert_eq!(
            dist.sample_for_bucket_with("M", 12, &mut rng).unwrap_err(),
            SamplingError::EmptyDistribution
        );
    }

    #[test]
    fn test_zero_weight_rows_not_registered() {
        let t = table(&[["A", "F", "0", "10", "1"]]);
        let range = BucketRange::new(0, 20).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();
        assert_eq!(dist.categories().count(), 0);
        assert_eq!(dist.index_for("F", 10).total_weight(), 0);
    }

    #[test]
    fn test_empty_table() {
        let rows: Vec<[&str; 5]> = Vec::new();
        let t = table(&rows);
        let range = BucketRange::new(0, 5).unwrap();
        let dist = TimeWindowedDistribution::build(&t, "count", &spec(), range).unwrap();
        assert_eq!(dist.index_for("", 3).total_weight(), 0);
    }
}
