//! CLI argument definitions.

use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

/// Arguments of `synthref inspect`.
#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// Path to generator config YAML file
    #[arg(long, short = 'c', env = "SYNTHREF_CONFIG")]
    pub config: PathBuf,

    /// Only inspect these datasets (comma-separated, empty = all datasets)
    #[arg(long, value_delimiter = ',')]
    pub datasets: Vec<String>,
}

/// Arguments of `synthref generate`.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Path to generator config YAML file
    #[arg(long, short = 'c', env = "SYNTHREF_CONFIG")]
    pub config: PathBuf,

    /// Dataset to sample from
    #[arg(long, short = 'd')]
    pub dataset: String,

    /// Number of records to generate
    #[arg(long, default_value = "1000")]
    pub count: u64,

    /// Random seed for deterministic generation (same seed = same records)
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Condition records on a month (format: YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    pub month: Option<NaiveDate>,

    /// Category value when conditioning on a month (e.g. "F")
    #[arg(long)]
    pub category: Option<String>,

    /// Number of parallel workers
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: u64,
}

/// Parse a `YYYY-MM` month into its first day.
pub fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|e| format!("invalid month '{s}' (expected YYYY-MM): {e}"))
}
