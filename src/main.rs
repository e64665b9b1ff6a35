//! Command-line interface for synthref
//!
//! # Usage Examples
//!
//! ## Inspect
//! ```bash
//! # Row counts, column types, null counts and window coverage
//! synthref inspect --config synthref.yaml
//!
//! # Only some datasets
//! synthref inspect --config synthref.yaml --datasets drugs,lab_tests
//! ```
//!
//! ## Generate
//! ```bash
//! # Unconditioned records, JSON Lines on stdout
//! synthref generate --config synthref.yaml --dataset drugs --count 1000
//!
//! # Records plausible for March 2015 in category "M", 8 workers
//! synthref generate --config synthref.yaml --dataset lab_tests \
//!   --count 100000 --month 2015-03 --category M --workers 8 --seed 7
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use synthref::{run_generate, run_inspect, GenerateArgs, InspectArgs};

#[derive(Parser)]
#[command(name = "synthref")]
#[command(about = "Synthetic records sampled from weighted reference tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load datasets and print a summary of each
    Inspect(InspectArgs),

    /// Generate records from one dataset as JSON Lines
    Generate(GenerateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing; stdout carries the records
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => run_inspect(args).await,
        Commands::Generate(args) => run_generate(args).await.map(|_| ()),
    }
}
