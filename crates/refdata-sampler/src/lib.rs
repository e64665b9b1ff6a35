//! Weighted and time-windowed sampling over reference tables.
//!
//! This crate builds the read-only structures every synthref dataset samples
//! from:
//!
//! - [`WeightedCumulativeIndex`] - O(log n) selection proportional to an
//!   integer weight column
//! - [`TimeWindowedDistribution`] - one index per `(category, bucket)`,
//!   restricted to rows whose appearance window covers the bucket
//! - [`Dataset`] - the facade answering "a random row" and "a random row
//!   valid for bucket B"
//!
//! # Architecture
//!
//! ```text
//!  ReferenceTable ──────────────┐
//!        │                      │
//!        ▼                      ▼
//! WeightedCumulativeIndex  TimeWindowedDistribution
//!   (global, per category)   (category, bucket) → index
//!        │                      │
//!        └──────────┬───────────┘
//!                   ▼
//!               Dataset ◄── caller-owned Rng
//!                   │
//!                   ▼
//!             RowView<'dataset>
//! ```
//!
//! Every structure is built once and never mutated afterwards; sampling only
//! reads immutable arrays and the caller's random source.
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use refdata_core::ReferenceTable;
//! use refdata_sampler::{BucketRange, Dataset, WindowSpec};
//!
//! let rows = vec![
//!     vec!["Aspirin", "F", "40", "100", "10"],
//!     vec!["Insulin", "F", "10", "60", "5"],
//! ];
//! let table =
//!     ReferenceTable::from_rows(&["drug", "sex", "count", "mean", "sd"], &rows).unwrap();
//!
//! let dataset = Dataset::builder("drugs", table, "count")
//!     .time_window(
//!         WindowSpec::new("mean", "sd").with_category("sex"),
//!         BucketRange::new(1, 300).unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let row = dataset.random_row_for_bucket("F", 110, &mut rng).unwrap();
//! assert_eq!(row.get_text(0), Some("Aspirin"));
//! ```

pub mod bucket;
pub mod columns;
pub mod dataset;
pub mod error;
pub mod index;
pub mod window;

// Re-exports for convenience
pub use bucket::{month_bucket, month_bucket_of, BucketRange, DEFAULT_EPOCH_YEAR, MAX_BUCKET_SPAN};
pub use columns::column_weights;
pub use dataset::{Dataset, DatasetBuilder};
pub use error::SamplingError;
pub use index::{IndexOrder, WeightedCumulativeIndex};
pub use window::{appearance_window, TimeWindowedDistribution, WindowSpec, DEFAULT_WINDOW_K};
