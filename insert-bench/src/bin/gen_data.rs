//! Writes `sim_data_<n>.csv` into the data directory for every generator size.
//!
//! Usage:
//!   cargo run --release --bin gen_data
//!   INSERT_BENCH_GEN_SIZES=100,1000 INSERT_BENCH_DATA_DIR=/tmp/sims cargo run --bin gen_data

use bench_core::synth;
use insert_bench::config::BenchConfig;
use std::process;
use std::time::Instant;

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

    for &size in &config.gen_sizes {
        let path = config.data_dir.join(synth::file_name(size));
        let start = Instant::now();
        let written = synth::generate(size, config.seed).and_then(|ds| ds.write_csv_path(&path));
        match written {
            Ok(()) => log::info!(
                "Wrote {size} rows to {} in {:.2}s",
                path.display(),
                start.elapsed().as_secs_f64()
            ),
            Err(e) => {
                log::error!("Failed to write {}: {e:#}", path.display());
                process::exit(1);
            }
        }
    }
}
