//! Dataset configuration loaded from YAML.
//!
//! ```yaml
//! epoch_year: 2000
//! datasets:
//!   - name: lab_tests
//!     path: data/lab_tests.csv
//!     weight_column: count
//!     index_order: descending_weight
//!     columns:
//!       loinc: text
//!     time_window:
//!       category_column: sex
//!       mean_column: mean_month
//!       stddev_column: sd_month
//!       min_bucket: 1
//!       max_bucket: 300
//!       k: 2.0
//! ```
//!
//! Relative `path`s are resolved against the directory of the config file.

use refdata_core::ColumnType;
use refdata_sampler::{BucketRange, IndexOrder, SamplingError, WindowSpec, DEFAULT_EPOCH_YEAR};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Two datasets share a name
    #[error("Duplicate dataset name: {0}")]
    DuplicateDataset(String),

    /// Dataset not found in config
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Invalid bucket range or window
    #[error("Dataset '{dataset}': {source}")]
    InvalidWindow {
        dataset: String,
        source: SamplingError,
    },
}

fn default_epoch_year() -> i32 {
    DEFAULT_EPOCH_YEAR
}

/// Top-level generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Year whose January is bucket 1
    #[serde(default = "default_epoch_year")]
    pub epoch_year: i32,

    /// Reference datasets
    pub datasets: Vec<DatasetConfig>,
}

/// One reference dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset name used on the command line
    pub name: String,

    /// CSV file with a header row
    pub path: PathBuf,

    /// Integer column holding observation counts
    pub weight_column: String,

    /// Column type pins overriding inference
    #[serde(default)]
    pub columns: HashMap<String, ColumnType>,

    /// Entry order of the weighted indices
    #[serde(default)]
    pub index_order: IndexOrder,

    /// Month-conditioned sampling
    #[serde(default)]
    pub time_window: Option<TimeWindowConfig>,
}

/// Time window settings of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowConfig {
    /// Category, mean, stddev columns and `k`
    #[serde(flatten)]
    pub spec: WindowSpec,

    /// First bucket key
    pub min_bucket: i64,

    /// Last bucket key (inclusive)
    pub max_bucket: i64,
}

impl TimeWindowConfig {
    /// The configured bucket range.
    pub fn bucket_range(&self) -> Result<BucketRange, SamplingError> {
        BucketRange::new(self.min_bucket, self.max_bucket)
    }
}

impl GeneratorConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, resolving dataset paths relative to it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(base) = path.parent() {
            for dataset in &mut config.datasets {
                if dataset.path.is_relative() {
                    dataset.path = base.join(&dataset.path);
                }
            }
        }
        Ok(config)
    }

    /// Get a dataset config by name.
    pub fn get_dataset(&self, name: &str) -> Result<&DatasetConfig, ConfigError> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ConfigError::DatasetNotFound(name.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if !names.insert(dataset.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(dataset.name.clone()));
            }
            if let Some(window) = &dataset.time_window {
                window
                    .bucket_range()
                    .map_err(|source| ConfigError::InvalidWindow {
                        dataset: dataset.name.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }
}
