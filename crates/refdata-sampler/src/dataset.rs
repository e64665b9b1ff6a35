//! Per-dataset sampling facade.
//!
//! A [`Dataset`] owns its reference table together with every index built
//! over it, so no index can outlive the rows it points into. Building is the
//! only mutable phase; a built dataset is `Send + Sync` and is shared across
//! generator workers through an `Arc`.

use crate::bucket::BucketRange;
use crate::error::SamplingError;
use crate::index::{IndexOrder, WeightedCumulativeIndex, EMPTY_INDEX};
use crate::window::{TimeWindowedDistribution, WindowSpec};
use rand::Rng;
use refdata_core::{FieldValue, ReferenceTable, RowView};
use std::collections::HashMap;

/// Time-conditioned part of a dataset.
#[derive(Debug)]
struct Windowed {
    spec: WindowSpec,
    distribution: TimeWindowedDistribution,
    /// Unconditioned index per category, used when a bucket is empty
    fallback: HashMap<String, WeightedCumulativeIndex>,
}

/// Reference table plus the indices answering sampling calls.
#[derive(Debug)]
pub struct Dataset {
    name: String,
    weight_column: String,
    table: ReferenceTable,
    global: WeightedCumulativeIndex,
    windowed: Option<Windowed>,
}

/// Builder for [`Dataset`].
#[derive(Debug)]
pub struct DatasetBuilder {
    name: String,
    table: ReferenceTable,
    weight_column: String,
    order: IndexOrder,
    window: Option<(WindowSpec, BucketRange)>,
}

impl DatasetBuilder {
    /// Entry order for every index of the dataset.
    pub fn index_order(mut self, order: IndexOrder) -> Self {
        self.order = order;
        self
    }

    /// Enable bucket-conditioned sampling.
    pub fn time_window(mut self, spec: WindowSpec, range: BucketRange) -> Self {
        self.window = Some((spec, range));
        self
    }

    /// Build the global index, then the per-category fallback indices and the
    /// time-windowed distribution.
    pub fn build(self) -> Result<Dataset, SamplingError> {
        let global = WeightedCumulativeIndex::build_with_order(
            &self.table,
            &self.weight_column,
            self.order,
        )?;

        let windowed = match self.window {
            Some((spec, range)) => {
                let fallback = WeightedCumulativeIndex::build_grouped(
                    &self.table,
                    &self.weight_column,
                    spec.category_column.as_deref(),
                    self.order,
                )?;
                let distribution = TimeWindowedDistribution::build(
                    &self.table,
                    &self.weight_column,
                    &spec,
                    range,
                )?;
                Some(Windowed {
                    spec,
                    distribution,
                    fallback,
                })
            }
            None => None,
        };

        if global.is_empty() {
            tracing::warn!("Dataset '{}' has zero total weight", self.name);
        }
        tracing::info!(
            "Dataset '{}' ready: {} rows, total weight {}{}",
            self.name,
            self.table.row_count(),
            global.total_weight(),
            if windowed.is_some() { ", time-windowed" } else { "" }
        );

        Ok(Dataset {
            name: self.name,
            weight_column: self.weight_column,
            table: self.table,
            global,
            windowed,
        })
    }
}

impl Dataset {
    /// Start building a dataset over `table`, weighted by `weight_column`.
    pub fn builder(
        name: impl Into<String>,
        table: ReferenceTable,
        weight_column: impl Into<String>,
    ) -> DatasetBuilder {
        DatasetBuilder {
            name: name.into(),
            table,
            weight_column: weight_column.into(),
            order: IndexOrder::default(),
            window: None,
        }
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the weight column.
    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }

    /// The underlying reference table.
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// The unconditioned index over the whole table.
    pub fn global_index(&self) -> &WeightedCumulativeIndex {
        &self.global
    }

    /// The time-windowed distribution, if configured.
    pub fn time_windowed(&self) -> Option<&TimeWindowedDistribution> {
        self.windowed.as_ref().map(|w| &w.distribution)
    }

    /// Column partitioning the time-windowed distribution, if any.
    pub fn category_column(&self) -> Option<&str> {
        self.windowed.as_ref()?.spec.category_column.as_deref()
    }

    /// Unconditioned index over the rows of `category`.
    pub fn category_index(&self, category: &str) -> Option<&WeightedCumulativeIndex> {
        self.windowed.as_ref()?.fallback.get(category)
    }

    /// A row drawn with probability proportional to its weight.
    pub fn random_row<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RowView<'_>, SamplingError> {
        let row = self.global.sample_with(rng)?;
        self.row(row)
    }

    /// A row of `category` plausible for `bucket`.
    ///
    /// When no row of the category covers the bucket, the draw comes from the
    /// category's unconditioned index instead. The fallback never widens to
    /// the global index: a record keeps the category it was asked for, so a
    /// category with no rows (or only zero-weight rows) yields
    /// [`SamplingError::EmptyDistribution`] rather than a row of another
    /// category. Datasets without a category column have the single category
    /// `""`, whose unconditioned index is the global one.
    pub fn random_row_for_bucket<R: Rng + ?Sized>(
        &self,
        category: &str,
        bucket: i64,
        rng: &mut R,
    ) -> Result<RowView<'_>, SamplingError> {
        let windowed = self
            .windowed
            .as_ref()
            .ok_or_else(|| SamplingError::NotTimeWindowed(self.name.clone()))?;

        let mut index = windowed.distribution.index_for(category, bucket);
        if index.is_empty() {
            tracing::trace!(
                "Dataset '{}': bucket {} of category '{}' is empty, using fallback",
                self.name,
                bucket,
                category
            );
            index = windowed.fallback.get(category).unwrap_or(&EMPTY_INDEX);
        }

        let row = index.sample_with(rng)?;
        self.row(row)
    }

    /// One field of a weighted random row.
    pub fn random_field<R: Rng + ?Sized>(
        &self,
        column: &str,
        rng: &mut R,
    ) -> Result<FieldValue<'_>, SamplingError> {
        let col = self.resolve(column)?;
        Ok(self.random_row(rng)?.value(col))
    }

    /// One field of a bucket-conditioned random row.
    pub fn random_field_for_bucket<R: Rng + ?Sized>(
        &self,
        column: &str,
        category: &str,
        bucket: i64,
        rng: &mut R,
    ) -> Result<FieldValue<'_>, SamplingError> {
        let col = self.resolve(column)?;
        Ok(self.random_row_for_bucket(category, bucket, rng)?.value(col))
    }

    fn resolve(&self, column: &str) -> Result<usize, SamplingError> {
        self.table
            .column_index(column)
            .ok_or_else(|| SamplingError::UnknownColumn(column.to_string()))
    }

    fn row(&self, row: usize) -> Result<RowView<'_>, SamplingError> {
        self.table.row(row).ok_or(SamplingError::RowOutOfRange {
            row,
            row_count: self.table.row_count(),
        })
    }
}
