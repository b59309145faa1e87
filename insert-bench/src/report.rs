//! Report module: prints per-dataset strategy tables and writes the summary CSV.

use crate::harness::BenchmarkLog;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// One dataset's comparison, labelled for the report.
#[derive(Debug, Clone)]
pub struct DatasetRun {
    pub label: String,
    pub rows: usize,
    pub log: BenchmarkLog,
}

/// One line of the summary CSV. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<'a> {
    pub strategy_name: &'a str,
    pub repetitions: u32,
    pub average_duration: f64,
    pub average_wall_duration: f64,
    pub rows: u64,
    pub dataset_label: &'a str,
}

/// `df1e<k>` for powers of ten, `df<n>` otherwise.
pub fn dataset_label(rows: usize) -> String {
    let mut k = 0;
    let mut n = rows;
    while n >= 10 && n % 10 == 0 {
        n /= 10;
        k += 1;
    }
    if n == 1 && k > 0 {
        format!("df1e{k}")
    } else {
        format!("df{rows}")
    }
}

pub fn summary_rows(runs: &[DatasetRun]) -> Vec<SummaryRow<'_>> {
    runs.iter()
        .flat_map(|run| {
            run.log.results().iter().map(move |r| SummaryRow {
                strategy_name: r.strategy.name(),
                repetitions: r.repetitions,
                average_duration: r.average_duration.as_secs_f64(),
                average_wall_duration: r.average_wall_duration.as_secs_f64(),
                rows: r.rows,
                dataset_label: &run.label,
            })
        })
        .collect()
}

pub fn write_summary<W: Write>(writer: W, runs: &[DatasetRun]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in summary_rows(runs) {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the summary to `path`, creating parent directories as needed.
pub fn write_summary_path(path: &Path, runs: &[DatasetRun]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_summary(file, runs).with_context(|| format!("writing {}", path.display()))
}

/// Print a formatted report comparing strategies per dataset.
pub fn print_report(runs: &[DatasetRun]) {
    println!("\n{}", "=".repeat(80));
    println!("  Insert Strategy Benchmark Report");
    println!("{}", "=".repeat(80));

    for run in runs {
        println!("\n  Dataset: {} ({} rows)", run.label, run.rows);
        println!("  {}", "-".repeat(74));
        println!(
            "  {:22} {:>5} {:>12} {:>12} {:>12} {:>6}",
            "Strategy", "Reps", "CPU (ms)", "Wall (ms)", "Rows/s", "x best"
        );
        println!("  {}", "-".repeat(74));

        let best = run
            .log
            .results()
            .iter()
            .map(|r| r.average_duration.as_secs_f64())
            .fold(f64::INFINITY, f64::min);

        for r in run.log.results() {
            let cpu = r.average_duration.as_secs_f64();
            let wall = r.average_wall_duration.as_secs_f64();
            let rows_per_sec = if wall > 0.0 { r.rows as f64 / wall } else { 0.0 };
            let relative = if best > 0.0 { cpu / best } else { 1.0 };
            println!(
                "  {:22} {:>5} {:>12.2} {:>12.2} {:>12.0} {:>6.1}",
                r.strategy.name(),
                r.repetitions,
                cpu * 1e3,
                wall * 1e3,
                rows_per_sec,
                relative
            );
        }

        for f in run.log.failures() {
            println!("  {:22} FAILED: {}", f.strategy.name(), f.error);
        }
    }

    println!("\n{}", "=".repeat(80));
    println!();
}
