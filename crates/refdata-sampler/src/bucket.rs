//! Month bucket keys.
//!
//! A bucket is a calendar month encoded as `(year - epoch_year) * 12 + month`
//! with `month` in `1..=12`. The sampling structures treat keys as opaque
//! integers; this module only exists so callers encode them consistently.

use crate::error::SamplingError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default epoch year for bucket keys.
pub const DEFAULT_EPOCH_YEAR: i32 = 2000;

/// Most buckets a [`BucketRange`] may span (10,000 years of months).
pub const MAX_BUCKET_SPAN: u64 = 120_000;

/// Bucket key of a calendar month.
pub fn month_bucket(year: i32, month: u32, epoch_year: i32) -> i64 {
    i64::from(year - epoch_year) * 12 + i64::from(month)
}

/// Bucket key of the month containing `date`.
pub fn month_bucket_of(date: NaiveDate, epoch_year: i32) -> i64 {
    month_bucket(date.year(), date.month(), epoch_year)
}

/// Inclusive range of bucket keys a distribution is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRange {
    /// Smallest bucket key
    pub min: i64,
    /// Largest bucket key
    pub max: i64,
}

impl BucketRange {
    /// Create a range; `min` must not exceed `max` and the range may hold at
    /// most [`MAX_BUCKET_SPAN`] buckets.
    pub fn new(min: i64, max: i64) -> Result<Self, SamplingError> {
        if min > max || max.abs_diff(min) >= MAX_BUCKET_SPAN {
            return Err(SamplingError::InvalidBucketRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Number of buckets in the range.
    pub fn len(&self) -> usize {
        (self.max.abs_diff(self.min) + 1) as usize
    }

    /// Always false; a valid range holds at least one bucket.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `bucket` lies in the range.
    pub fn contains(&self, bucket: i64) -> bool {
        (self.min..=self.max).contains(&bucket)
    }

    /// Position of `bucket` relative to `min`.
    pub fn offset(&self, bucket: i64) -> Option<usize> {
        self.contains(bucket)
            .then(|| bucket.abs_diff(self.min) as usize)
    }

    /// Clip `[lo, hi]` to the range, or `None` if they do not overlap.
    pub fn clip(&self, lo: i64, hi: i64) -> Option<(i64, i64)> {
        let (lo, hi) = (lo.max(self.min), hi.min(self.max));
        (lo <= hi).then_some((lo, hi))
    }
}
