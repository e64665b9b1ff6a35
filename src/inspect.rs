//! Dataset summaries for `synthref inspect`.

use crate::args::InspectArgs;
use crate::config::GeneratorConfig;
use crate::load::load_dataset;
use anyhow::Context;
use refdata_sampler::Dataset;
use std::fmt::Write;

/// Human-readable summary of a built dataset.
pub fn describe_dataset(dataset: &Dataset) -> String {
    let table = dataset.table();
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "{}: {} rows, total weight {} (weight column '{}')",
        dataset.name(),
        table.row_count(),
        dataset.global_index().total_weight(),
        dataset.weight_column()
    );
    for (col, spec) in table.schema().columns().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:<24} {:<10} {} nulls",
            spec.name,
            spec.column_type.to_string(),
            table.null_count(col)
        );
    }
    let _ = writeln!(
        out,
        "  text: {} bytes, heap: {} bytes",
        table.text_bytes(),
        table.heap_bytes()
    );

    if let Some(dist) = dataset.time_windowed() {
        let range = dist.bucket_range();
        let _ = writeln!(
            out,
            "  time window: buckets {}..={}, k = {}, category column {}",
            range.min,
            range.max,
            dist.k(),
            dataset.category_column().unwrap_or("(none)")
        );
        let mut categories: Vec<_> = dist.categories().collect();
        categories.sort_unstable();
        for category in categories {
            let _ = writeln!(
                out,
                "    {:<16} {} of {} buckets covered",
                format!("'{category}'"),
                dist.covered_buckets(category),
                range.len()
            );
        }
    }
    out
}

/// Run `synthref inspect`: load every selected dataset and print a summary.
pub async fn run_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let config = GeneratorConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let selected = if args.datasets.is_empty() {
        config.datasets.clone()
    } else {
        args.datasets
            .iter()
            .map(|name| config.get_dataset(name).cloned())
            .collect::<Result<Vec<_>, _>>()?
    };

    for dataset_config in selected {
        let dataset = tokio::task::spawn_blocking(move || load_dataset(&dataset_config))
            .await
            .context("Dataset loading task failed")??;
        print!("{}", describe_dataset(&dataset));
    }
    Ok(())
}
