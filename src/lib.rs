//! synthref library
//!
//! Generates synthetic records by sampling real reference tables (diagnosis,
//! drug or lab-test frequency tables) in proportion to their observed counts,
//! optionally restricted to rows plausible for a given month.
//!
//! # Modules
//!
//! - [`config`] - YAML generator configuration
//! - [`load`] - CSV reading and dataset construction
//! - [`generate`] - parallel, seed-deterministic record generation
//! - [`inspect`] - dataset summaries
//!
//! The columnar table lives in `refdata_core`; the weighted and
//! time-windowed indices live in `refdata_sampler`.
//!
//! # CLI Usage
//!
//! ```bash
//! # Summarize every configured dataset
//! synthref inspect --config synthref.yaml
//!
//! # 1000 drug records for February 2009, female patients, 4 workers
//! synthref generate --config synthref.yaml --dataset drugs \
//!   --count 1000 --month 2009-02 --category F --workers 4
//! ```

pub mod args;
pub mod config;
pub mod generate;
pub mod inspect;
pub mod load;

pub use args::{GenerateArgs, InspectArgs};
pub use config::{ConfigError, DatasetConfig, GeneratorConfig, TimeWindowConfig};
pub use generate::{generate_to, run_generate, BucketCondition, GenerateMetrics, GenerateRequest};
pub use inspect::run_inspect;
