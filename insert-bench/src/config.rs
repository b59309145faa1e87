//! Runtime settings, read from the environment (and an optional `.env` file).
//!
//! | Variable                    | Default                   |
//! |-----------------------------|---------------------------|
//! | `INSERT_BENCH_DATABASE`     | `insert_bench.sqlite3`    |
//! | `INSERT_BENCH_TABLE`        | `test_table`              |
//! | `INSERT_BENCH_REPS`         | `5`                       |
//! | `INSERT_BENCH_CHUNK_SIZE`   | unset                     |
//! | `INSERT_BENCH_SIZES`        | `100,1000,10000,100000`   |
//! | `INSERT_BENCH_GEN_SIZES`    | `100,...,10000000`        |
//! | `INSERT_BENCH_SEED`         | `42`                      |
//! | `INSERT_BENCH_DATA_DIR`     | `./data/sims`             |
//! | `INSERT_BENCH_OUTPUT`       | `./data/insert_times.csv` |
//! | `INSERT_BENCH_TEMP_DIR`     | system temp dir           |
//! | `INSERT_BENCH_JOURNAL_MODE` | `WAL`                     |
//! | `INSERT_BENCH_SYNCHRONOUS`  | `NORMAL`                  |
//! | `INSERT_BENCH_LOG_LEVEL`    | `info`                    |
//! | `INSERT_BENCH_LOG_FILE`     | unset                     |

use crate::db::ConnectionSettings;
use crate::harness::{DEFAULT_REPETITIONS, DEFAULT_TABLE};
use anyhow::{bail, Context, Result};
use bench_core::synth;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DATABASE: &str = "insert_bench.sqlite3";
const DEFAULT_SIZES: [usize; 4] = [100, 1_000, 10_000, 100_000];
const DEFAULT_DATA_DIR: &str = "./data/sims";
const DEFAULT_OUTPUT: &str = "./data/insert_times.csv";

#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// SQLite file path, or `:memory:`.
    pub database: String,
    pub table: String,
    pub repetitions: u32,
    pub chunk_size: Option<usize>,
    /// Dataset sizes the experiment driver benchmarks.
    pub sizes: Vec<usize>,
    /// Dataset sizes the generator writes.
    pub gen_sizes: Vec<usize>,
    pub seed: u64,
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub temp_dir: PathBuf,
    pub connection: ConnectionSettings,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl BenchConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("loading .env");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let repetitions = parse_or(&get, "INSERT_BENCH_REPS", DEFAULT_REPETITIONS)?;
        if repetitions == 0 {
            bail!("INSERT_BENCH_REPS must be at least 1");
        }

        let defaults = ConnectionSettings::default();
        Ok(Self {
            database: get("INSERT_BENCH_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            table: get("INSERT_BENCH_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            repetitions,
            chunk_size: get("INSERT_BENCH_CHUNK_SIZE")
                .map(|v| parse("INSERT_BENCH_CHUNK_SIZE", &v))
                .transpose()?,
            sizes: match get("INSERT_BENCH_SIZES") {
                Some(v) => parse_sizes("INSERT_BENCH_SIZES", &v)?,
                None => DEFAULT_SIZES.to_vec(),
            },
            gen_sizes: match get("INSERT_BENCH_GEN_SIZES") {
                Some(v) => parse_sizes("INSERT_BENCH_GEN_SIZES", &v)?,
                None => synth::DEFAULT_SIZES.to_vec(),
            },
            seed: parse_or(&get, "INSERT_BENCH_SEED", synth::DEFAULT_SEED)?,
            data_dir: get("INSERT_BENCH_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            output: get("INSERT_BENCH_OUTPUT")
                .unwrap_or_else(|| DEFAULT_OUTPUT.to_string())
                .into(),
            temp_dir: get("INSERT_BENCH_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            connection: ConnectionSettings {
                journal_mode: get("INSERT_BENCH_JOURNAL_MODE").unwrap_or(defaults.journal_mode),
                synchronous: get("INSERT_BENCH_SYNCHRONOUS").unwrap_or(defaults.synchronous),
                busy_timeout: defaults.busy_timeout,
            },
            log_level: parse_or(&get, "INSERT_BENCH_LOG_LEVEL", LevelFilter::Info)?,
            log_file: get("INSERT_BENCH_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{key}={value:?}: {e}"))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => parse(key, &v),
        None => Ok(default),
    }
}

fn parse_sizes(key: &str, value: &str) -> Result<Vec<usize>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse(key, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BenchConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BenchConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database, DEFAULT_DATABASE);
        assert_eq!(cfg.table, "test_table");
        assert_eq!(cfg.repetitions, 5);
        assert_eq!(cfg.chunk_size, None);
        assert_eq!(cfg.sizes, vec![100, 1_000, 10_000, 100_000]);
        assert_eq!(cfg.gen_sizes.last(), Some(&10_000_000));
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.connection, ConnectionSettings::default());
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("INSERT_BENCH_DATABASE", ":memory:"),
            ("INSERT_BENCH_REPS", "3"),
            ("INSERT_BENCH_CHUNK_SIZE", "500"),
            ("INSERT_BENCH_SIZES", "10, 20,"),
            ("INSERT_BENCH_LOG_LEVEL", "debug"),
            ("INSERT_BENCH_SYNCHRONOUS", "FULL"),
        ])
        .unwrap();
        assert_eq!(cfg.database, ":memory:");
        assert_eq!(cfg.repetitions, 3);
        assert_eq!(cfg.chunk_size, Some(500));
        assert_eq!(cfg.sizes, vec![10, 20]);
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert_eq!(cfg.connection.synchronous, "FULL");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("INSERT_BENCH_REPS", "  ")]).unwrap();
        assert_eq!(cfg.repetitions, DEFAULT_REPETITIONS);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(config(&[("INSERT_BENCH_REPS", "five")]).is_err());
        assert!(config(&[("INSERT_BENCH_REPS", "0")]).is_err());
        assert!(config(&[("INSERT_BENCH_SIZES", "100,lots")]).is_err());
        assert!(config(&[("INSERT_BENCH_LOG_LEVEL", "loud")]).is_err());
    }
}
