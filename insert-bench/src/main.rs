//! Experiment driver: runs the strategy comparison for every configured
//! dataset size, prints the report and writes the summary CSV.
//!
//! Datasets are read from `<INSERT_BENCH_DATA_DIR>/sim_data_<n>.csv`. A
//! missing file is generated in memory with the configured seed instead.
//!
//! Usage:
//!   cargo run --release --bin insert-bench
//!   INSERT_BENCH_SIZES=100,1000 INSERT_BENCH_DATABASE=:memory: cargo run --release

use anyhow::{Context, Result};
use bench_core::dataset::Dataset;
use bench_core::synth;
use insert_bench::config::BenchConfig;
use insert_bench::db::Database;
use insert_bench::report::{dataset_label, print_report, write_summary_path, DatasetRun};
use insert_bench::InsertionBenchmark;
use std::process;

fn load_dataset(config: &BenchConfig, size: usize) -> Result<Dataset> {
    let path = config.data_dir.join(synth::file_name(size));
    if path.exists() {
        log::info!("Loading {}", path.display());
        return Dataset::read_csv_path(&path);
    }

    log::warn!(
        "{} not found, generating {size} rows with seed {}",
        path.display(),
        config.seed
    );
    synth::generate(size, config.seed)
}

fn run(config: &BenchConfig) -> Result<()> {
    let db = Database::open(&config.database, config.connection.clone())
        .with_context(|| format!("opening {}", config.database))?;
    log::info!(
        "Benchmarking into {} table `{}` ({} reps, chunk size {:?})",
        db.describe(),
        config.table,
        config.repetitions,
        config.chunk_size
    );

    let mut runs = Vec::with_capacity(config.sizes.len());
    for &size in &config.sizes {
        let dataset = load_dataset(config, size)?;
        let label = dataset_label(size);
        log::info!("Dataset {label}: {} rows", dataset.len());

        let mut bench = InsertionBenchmark::new(&db, &dataset)
            .with_table(config.table.as_str())
            .with_temp_dir(&config.temp_dir)
            .with_repetitions(config.repetitions)
            .with_chunk_size(config.chunk_size);
        bench.run_comparison();

        runs.push(DatasetRun {
            label,
            rows: dataset.len(),
            log: bench.into_log(),
        });
    }

    print_report(&runs);
    write_summary_path(&config.output, &runs)?;
    log::info!("Summary written to {}", config.output.display());

    Ok(())
}

fn main() {
    let config = BenchConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e:#}. Exiting.");
        process::exit(1);
    });

    bench_core::initialize_logger(config.log_level, config.log_file.as_deref()).unwrap_or_else(
        |e| {
            eprintln!("Failed to initialize logger: {e:#}. Exiting.");
            process::exit(1);
        },
    );

    if let Err(e) = run(&config) {
        log::error!("Benchmark aborted: {e:#}");
        process::exit(1);
    }
}
