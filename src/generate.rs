//! Record generation.
//!
//! Records are produced by `workers` blocking tasks sharing one
//! `Arc<Dataset>`. Worker `w` draws `worker_share(count, workers, w)` records
//! from its own `StdRng`, and the output concatenates workers in order, so
//! the same `(seed, workers)` pair always yields the same lines.

use crate::args::GenerateArgs;
use crate::config::GeneratorConfig;
use crate::load::load_dataset;
use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::SeedableRng;
use refdata_sampler::{month_bucket_of, Dataset};
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Month condition of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCondition {
    /// Category value, `""` for datasets without a category column
    pub category: String,
    /// Bucket key of the month
    pub bucket: i64,
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Total number of records across all workers.
    pub count: u64,
    /// Base seed; each worker derives its own with `worker_seed`.
    pub seed: u64,
    /// Number of parallel workers (0 is treated as 1).
    pub workers: u64,
    /// Month condition, or `None` for unconditioned draws.
    pub condition: Option<BucketCondition>,
}

/// Metrics from a generate operation.
#[derive(Debug, Clone, Default)]
pub struct GenerateMetrics {
    /// Number of records written.
    pub rows_written: u64,
    /// Bytes written, newlines included.
    pub bytes_written: u64,
    /// Time spent sampling, serializing and writing.
    pub generation_duration: Duration,
    /// Total time taken.
    pub total_duration: Duration,
}

impl GenerateMetrics {
    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.rows_written as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// RNG seed of a worker.
pub fn worker_seed(seed: u64, worker: u64) -> u64 {
    seed.wrapping_add(worker.wrapping_mul(0x9E3779B97F4A7C15))
}

/// Number of records worker `worker` produces; the first `count % workers`
/// workers take one extra.
pub fn worker_share(count: u64, workers: u64, worker: u64) -> u64 {
    let workers = workers.max(1);
    count / workers + u64::from(worker < count % workers)
}

/// Records a worker hands to the writer at a time.
pub const CHUNK_RECORDS: usize = 1024;

/// Chunks a worker may queue before it waits for the writer.
const CHUNKS_IN_FLIGHT: usize = 4;

type Chunk = anyhow::Result<Vec<String>>;

/// One worker's records as JSON lines, drawn lazily.
pub fn worker_records<'a>(
    dataset: &'a Dataset,
    request: &'a GenerateRequest,
    worker: u64,
) -> impl Iterator<Item = anyhow::Result<String>> + 'a {
    let share = worker_share(request.count, request.workers, worker);
    let mut rng = StdRng::seed_from_u64(worker_seed(request.seed, worker));

    (0..share).map(move |_| {
        let row = match &request.condition {
            Some(condition) => {
                dataset.random_row_for_bucket(&condition.category, condition.bucket, &mut rng)?
            }
            None => dataset.random_row(&mut rng)?,
        };
        Ok(serde_json::to_string(&row)?)
    })
}

/// Produce one worker's records into `tx` in chunks. Stops early on the
/// first sampling error or when the writer has gone away.
fn run_worker(
    dataset: &Dataset,
    request: &GenerateRequest,
    worker: u64,
    tx: mpsc::Sender<Chunk>,
) {
    let mut chunk = Vec::with_capacity(CHUNK_RECORDS);
    let mut produced = 0u64;

    for record in worker_records(dataset, request, worker) {
        match record {
            Ok(line) => chunk.push(line),
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
        if chunk.len() == CHUNK_RECORDS {
            produced += CHUNK_RECORDS as u64;
            let full = std::mem::replace(&mut chunk, Vec::with_capacity(CHUNK_RECORDS));
            if tx.blocking_send(Ok(full)).is_err() {
                return;
            }
        }
    }

    produced += chunk.len() as u64;
    if !chunk.is_empty() && tx.blocking_send(Ok(chunk)).is_err() {
        return;
    }
    debug!("Worker {} generated {} records", worker, produced);
}

/// Generate all records into `writer`, one JSON object per line.
///
/// Workers run concurrently, each behind a bounded channel; the writer
/// drains worker 0 to completion, then worker 1, and so on, so output order
/// is fixed while memory stays bounded by the channel capacity.
pub async fn generate_to<W: Write>(
    dataset: Arc<Dataset>,
    request: GenerateRequest,
    writer: W,
) -> anyhow::Result<GenerateMetrics> {
    let start_time = Instant::now();
    let request = Arc::new(request);

    let workers: Vec<_> = (0..request.workers.max(1))
        .map(|worker| {
            let (tx, rx) = mpsc::channel(CHUNKS_IN_FLIGHT);
            let dataset = Arc::clone(&dataset);
            let request = Arc::clone(&request);
            let handle =
                tokio::task::spawn_blocking(move || run_worker(&dataset, &request, worker, tx));
            (rx, handle)
        })
        .collect();

    let mut writer = BufWriter::new(writer);
    let mut metrics = GenerateMetrics::default();

    for (worker, (mut rx, handle)) in workers.into_iter().enumerate() {
        while let Some(chunk) = rx.recv().await {
            let chunk =
                chunk.with_context(|| format!("Generator worker {worker} could not sample"))?;
            for line in &chunk {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
                metrics.bytes_written += line.len() as u64 + 1;
            }
            metrics.rows_written += chunk.len() as u64;

            if metrics.rows_written % 100_000 < chunk.len() as u64 {
                debug!("Written {} rows", metrics.rows_written);
            }
        }
        handle
            .await
            .with_context(|| format!("Generator worker {worker} failed"))?;
    }
    writer.flush().context("Failed to write records")?;

    metrics.generation_duration = start_time.elapsed();
    metrics.total_duration = metrics.generation_duration;
    Ok(metrics)
}

/// Resolve the month condition of a run against its dataset.
pub fn bucket_condition(
    dataset: &Dataset,
    args: &GenerateArgs,
    epoch_year: i32,
) -> anyhow::Result<Option<BucketCondition>> {
    let Some(month) = args.month else {
        if args.category.is_some() {
            bail!("--category requires --month");
        }
        return Ok(None);
    };

    if dataset.time_windowed().is_none() {
        bail!(
            "Dataset '{}' has no time_window configured; --month is not supported",
            dataset.name()
        );
    }

    let category = match (dataset.category_column(), &args.category) {
        (Some(_), Some(category)) => category.clone(),
        (Some(column), None) => bail!(
            "Dataset '{}' is partitioned by '{}'; --category is required with --month",
            dataset.name(),
            column
        ),
        (None, Some(_)) => bail!(
            "Dataset '{}' has no category column; drop --category",
            dataset.name()
        ),
        (None, None) => String::new(),
    };

    Ok(Some(BucketCondition {
        category,
        bucket: month_bucket_of(month, epoch_year),
    }))
}

/// Run `synthref generate`: load the dataset and write records to stdout.
pub async fn run_generate(args: GenerateArgs) -> anyhow::Result<GenerateMetrics> {
    let start_time = Instant::now();

    let config = GeneratorConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    let dataset_config = config.get_dataset(&args.dataset)?.clone();
    let dataset = tokio::task::spawn_blocking(move || load_dataset(&dataset_config))
        .await
        .context("Dataset loading task failed")??;

    let condition = bucket_condition(&dataset, &args, config.epoch_year)?;
    if let Some(condition) = &condition {
        info!(
            "Conditioning on bucket {} (category '{}')",
            condition.bucket, condition.category
        );
    }

    let request = GenerateRequest {
        count: args.count,
        seed: args.seed,
        workers: args.workers,
        condition,
    };
    let mut metrics = generate_to(Arc::new(dataset), request, std::io::stdout()).await?;
    metrics.total_duration = start_time.elapsed();

    info!(
        "Generation complete: {} rows, {} bytes in {:?} ({:.2} rows/sec)",
        metrics.rows_written,
        metrics.bytes_written,
        metrics.total_duration,
        metrics.rows_per_second()
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use refdata_core::ReferenceTable;
    use refdata_sampler::{BucketRange, WindowSpec};

    fn dataset(windowed: bool) -> Dataset {
        let rows = vec![
            vec!["Aspirin", "F", "40", "100", "10"],
            vec!["Insulin", "M", "10", "60", "5"],
        ];
        let table =
            ReferenceTable::from_rows(&["drug", "sex", "count", "mean", "sd"], &rows).unwrap();
        let mut builder = Dataset::builder("drugs", table, "count");
        if windowed {
            builder = builder.time_window(
                WindowSpec::new("mean", "sd").with_category("sex"),
                BucketRange::new(1, 300).unwrap(),
            );
        }
        builder.build().unwrap()
    }

    fn args(month: Option<&str>, category: Option<&str>) -> GenerateArgs {
        GenerateArgs {
            config: "unused.yaml".into(),
            dataset: "drugs".to_string(),
            count: 10,
            seed: 42,
            month: month.map(|m| crate::args::parse_month(m).unwrap()),
            category: category.map(String::from),
            workers: 1,
        }
    }

    #[test]
    fn test_worker_share() {
        let shares: Vec<_> = (0..3).map(|w| worker_share(10, 3, w)).collect();
        assert_eq!(shares, vec![4, 3, 3]);
        assert_eq!(worker_share(2, 4, 3), 0);
        assert_eq!(worker_share(5, 0, 0), 5);
    }

    #[test]
    fn test_worker_seed() {
        assert_eq!(worker_seed(42, 0), 42);
        assert_ne!(worker_seed(42, 1), worker_seed(42, 2));
        // wraps instead of overflowing
        let _ = worker_seed(u64::MAX, u64::MAX);
    }

    #[test]
    fn test_bucket_condition() {
        let windowed = dataset(true);
        let plain = dataset(false);

        let condition = bucket_condition(&windowed, &args(Some("2009-02"), Some("F")), 2000)
            .unwrap()
            .unwrap();
        assert_eq!(condition.bucket, 110);
        assert_eq!(condition.category, "F");

        assert!(bucket_condition(&windowed, &args(None, None), 2000)
            .unwrap()
            .is_none());
        assert!(bucket_condition(&windowed, &args(Some("2009-02"), None), 2000).is_err());
        assert!(bucket_condition(&windowed, &args(None, Some("F")), 2000).is_err());
        assert!(bucket_condition(&plain, &args(Some("2009-02"), None), 2000).is_err());
    }

    async fn generate_lines(
        dataset: Arc<Dataset>,
        request: GenerateRequest,
    ) -> anyhow::Result<(Vec<String>, GenerateMetrics)> {
        let mut out = Vec::new();
        let metrics = generate_to(dataset, request, &mut out).await?;
        let text = String::from_utf8(out)?;
        Ok((text.lines().map(String::from).collect(), metrics))
    }

    #[test]
    fn test_worker_records() {
        let dataset = dataset(true);
        let request = GenerateRequest {
            count: 20,
            seed: 7,
            workers: 1,
            condition: Some(BucketCondition {
                category: "F".to_string(),
                bucket: month_bucket_of(NaiveDate::from_ymd_opt(2009, 2, 1).unwrap(), 2000),
            }),
        };

        let lines: Vec<_> = worker_records(&dataset, &request, 0)
            .collect::<anyhow::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 20);
        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["drug"], "Aspirin");
            assert_eq!(value["count"], 40);
        }
    }

    #[test]
    fn test_huge_count_draws_lazily() {
        let dataset = dataset(false);
        let request = GenerateRequest {
            count: 1 << 62,
            seed: 7,
            workers: 1,
            condition: None,
        };

        let lines: Vec<_> = worker_records(&dataset, &request, 0)
            .take(3)
            .collect::<anyhow::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_is_deterministic() {
        let dataset = Arc::new(dataset(false));
        let request = GenerateRequest {
            count: 5001,
            seed: 42,
            workers: 4,
            condition: None,
        };

        let (first, metrics) = generate_lines(Arc::clone(&dataset), request.clone())
            .await
            .unwrap();
        let (second, _) = generate_lines(Arc::clone(&dataset), request.clone())
            .await
            .unwrap();
        assert_eq!(first.len(), 5001);
        assert_eq!(metrics.rows_written, 5001);
        assert_eq!(
            metrics.bytes_written,
            first.iter().map(|l| l.len() as u64 + 1).sum::<u64>()
        );
        assert_eq!(first, second);

        // worker order, each worker's records in draw order
        let mut expected = Vec::new();
        for worker in 0..4 {
            for record in worker_records(&dataset, &request, worker) {
                expected.push(record.unwrap());
            }
        }
        assert_eq!(first, expected);
    }

    #[tokio::test]
    async fn test_generate_reports_empty_distribution() {
        let dataset = Arc::new(dataset(true));
        let request = GenerateRequest {
            count: 3,
            seed: 1,
            workers: 2,
            condition: Some(BucketCondition {
                category: "X".to_string(),
                bucket: 110,
            }),
        };

        let err = generate_lines(dataset, request).await.unwrap_err();
        assert!(format!("{err:#}").contains("could not sample"));
    }

    #[tokio::test]
    async fn test_generate_zero_records() {
        let dataset = Arc::new(dataset(false));
        let request = GenerateRequest {
            count: 0,
            seed: 1,
            workers: 3,
            condition: None,
        };

        let (lines, metrics) = generate_lines(dataset, request).await.unwrap();
        assert!(lines.is_empty());
        assert_eq!(metrics.bytes_written, 0);
    }
}
