//! Weighted cumulative index.
//!
//! Entries are `(cumulative weight, row)` pairs with strictly increasing
//! cumulative weights. A draw `d` in `[0, total)` selects the first entry
//! whose cumulative weight is strictly greater than `d`, so a row of weight
//! `w` owns exactly `w` consecutive draws and a draw equal to a boundary
//! belongs to the next entry. Rows of weight zero are never stored.

use crate::columns::{category_key, column_weights, resolve_column};
use crate::error::SamplingError;
use rand::Rng;
use refdata_core::ReferenceTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Order in which rows are laid out in the cumulative array.
///
/// The order only affects which draws map to which row, never the
/// probability of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrder {
    /// Table order
    #[default]
    TableOrder,
    /// Heaviest rows first; ties keep table order
    DescendingWeight,
}

/// Cumulative-weight index over a subset of table rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeightedCumulativeIndex {
    cumulative: Vec<u64>,
    rows: Vec<usize>,
}

/// Shared index with zero total weight.
pub(crate) static EMPTY_INDEX: WeightedCumulativeIndex = WeightedCumulativeIndex::empty();

impl WeightedCumulativeIndex {
    /// An index with no entries.
    pub const fn empty() -> Self {
        Self {
            cumulative: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build an index over every row of `table`, weighted by `weight_column`.
    pub fn build(table: &ReferenceTable, weight_column: &str) -> Result<Self, SamplingError> {
        Self::build_with_order(table, weight_column, IndexOrder::TableOrder)
    }

    /// Build an index over every row of `table` with the given entry order.
    pub fn build_with_order(
        table: &ReferenceTable,
        weight_column: &str,
        order: IndexOrder,
    ) -> Result<Self, SamplingError> {
        let weights = column_weights(table, weight_column)?;
        let index = Self::from_weights_ordered(weights.into_iter().enumerate(), order)?;

        tracing::debug!(
            "Built weighted index on '{}': {} of {} rows, total weight {}",
            weight_column,
            index.len(),
            table.row_count(),
            index.total_weight()
        );

        Ok(index)
    }

    /// Build one index per category value, each over the rows of that
    /// category only. Without a category column every row lands under `""`.
    pub fn build_grouped(
        table: &ReferenceTable,
        weight_column: &str,
        category_column: Option<&str>,
        order: IndexOrder,
    ) -> Result<HashMap<String, Self>, SamplingError> {
        let weights = column_weights(table, weight_column)?;
        let category_col = category_column
            .map(|name| resolve_column(table, name))
            .transpose()?;

        let mut groups: HashMap<String, Vec<(usize, u64)>> = HashMap::new();
        for (row, weight) in weights.into_iter().enumerate() {
            groups
                .entry(category_key(table, row, category_col))
                .or_default()
                .push((row, weight));
        }

        groups
            .into_iter()
            .map(|(category, entries)| {
                Self::from_weights_ordered(entries, order).map(|index| (category, index))
            })
            .collect()
    }

    /// Build an index from `(row, weight)` pairs, keeping their order.
    /// Zero weights are skipped.
    pub fn from_weights<I>(weights: I) -> Result<Self, SamplingError>
    where
        I: IntoIterator<Item = (usize, u64)>,
    {
        let mut cumulative = Vec::new();
        let mut rows = Vec::new();
        let mut running: u64 = 0;

        for (row, weight) in weights {
            if weight == 0 {
                continue;
            }
            running = running
                .checked_add(weight)
                .ok_or(SamplingError::WeightOverflow { row })?;
            cumulative.push(running);
            rows.push(row);
        }

        Ok(Self { cumulative, rows })
    }

    /// Build an index from `(row, weight)` pairs in the requested order.
    pub fn from_weights_ordered<I>(weights: I, order: IndexOrder) -> Result<Self, SamplingError>
    where
        I: IntoIterator<Item = (usize, u64)>,
    {
        match order {
            IndexOrder::TableOrder => Self::from_weights(weights),
            IndexOrder::DescendingWeight => {
                let mut entries: Vec<(usize, u64)> = weights.into_iter().collect();
                entries.sort_by(|a, b| b.1.cmp(&a.1));
                Self::from_weights(entries)
            }
        }
    }

    /// Sum of all weights in the index.
    #[inline]
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Number of entries (rows with positive weight).
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the index has zero total weight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indexed rows in entry order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Weight of the entry at `entry`.
    pub fn weight_of_entry(&self, entry: usize) -> Option<u64> {
        let upper = *self.cumulative.get(entry)?;
        let lower = match entry {
            0 => 0,
            _ => self.cumulative[entry - 1],
        };
        Some(upper - lower)
    }

    /// Row selected by `draw`, which must lie in `[0, total_weight)`.
    #[inline]
    pub fn sample(&self, draw: u64) -> Result<usize, SamplingError> {
        let total = self.total_weight();
        if total == 0 {
            return Err(SamplingError::EmptyDistribution);
        }
        if draw >= total {
            return Err(SamplingError::IndexOutOfRange { draw, total });
        }
        let entry = self.cumulative.partition_point(|&c| c <= draw);
        Ok(self.rows[entry])
    }

    /// Draw uniformly from `[0, total_weight)` and select the matching row.
    #[inline]
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, SamplingError> {
        let total = self.total_weight();
        if total == 0 {
            return Err(SamplingError::EmptyDistribution);
        }
        self.sample(rng.random_range(0..total))
    }
}
