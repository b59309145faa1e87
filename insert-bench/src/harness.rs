//! The insertion benchmark: times each strategy against a scratch table.

use crate::db::{self, Database};
use crate::error::{BenchError, BenchResult};
use crate::strategy::{InsertOptions, InsertTarget, Strategy};
use crate::timing::Stopwatch;
use bench_core::dataset::Dataset;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TABLE: &str = "test_table";
pub const DEFAULT_REPETITIONS: u32 = 5;

/// Averages for one strategy over one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub strategy: Strategy,
    pub repetitions: u32,
    /// Mean process CPU time per repetition.
    pub average_duration: Duration,
    pub average_wall_duration: Duration,
    /// Rows in the scratch table once the last repetition finished.
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialFailure {
    pub strategy: Strategy,
    pub error: String,
}

/// Results keyed by strategy, in the order they were first recorded.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkLog {
    results: Vec<TrialResult>,
    failures: Vec<TrialFailure>,
}

impl BenchmarkLog {
    /// Record a result, replacing an earlier one for the same strategy in place.
    pub fn record(&mut self, result: TrialResult) {
        self.failures.retain(|f| f.strategy != result.strategy);
        match self
            .results
            .iter_mut()
            .find(|r| r.strategy == result.strategy)
        {
            Some(slot) => *slot = result,
            None => self.results.push(result),
        }
    }

    /// Record a failed trial; any earlier result for the strategy is dropped.
    pub fn record_failure(&mut self, strategy: Strategy, error: &BenchError) {
        self.results.retain(|r| r.strategy != strategy);
        self.failures.retain(|f| f.strategy != strategy);
        self.failures.push(TrialFailure {
            strategy,
            error: error.to_string(),
        });
    }

    pub fn get(&self, strategy: Strategy) -> Option<&TrialResult> {
        self.results.iter().find(|r| r.strategy == strategy)
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn failures(&self) -> &[TrialFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Times insertion strategies for one dataset against one database.
///
/// Each trial acquires its own connection from the [`Database`] handle and
/// releases it before returning; nothing but the log survives between
/// trials.
pub struct InsertionBenchmark<'a> {
    db: &'a Database,
    dataset: &'a Dataset,
    table: String,
    temp_dir: PathBuf,
    repetitions: u32,
    chunk_size: Option<usize>,
    log: BenchmarkLog,
}

impl<'a> InsertionBenchmark<'a> {
    pub fn new(db: &'a Database, dataset: &'a Dataset) -> Self {
        Self {
            db,
            dataset,
            table: DEFAULT_TABLE.to_string(),
            temp_dir: std::env::temp_dir(),
            repetitions: DEFAULT_REPETITIONS,
            chunk_size: None,
            log: BenchmarkLog::default(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Repetitions used by [`run_comparison`](Self::run_comparison).
    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Chunk size used by [`run_comparison`](Self::run_comparison).
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Drop the scratch table if it exists.
    pub fn prepare(&self) -> BenchResult<()> {
        let conn = self.db.connect()?;
        db::drop_table(&conn, &self.table)
    }

    /// Time `repetitions` runs of `strategy` and return the mean CPU time.
    ///
    /// Every repetition recreates the scratch table before inserting, so the
    /// table holds exactly one copy of the dataset afterwards.
    pub fn time_strategy(
        &mut self,
        strategy: Strategy,
        repetitions: u32,
        chunk_size: Option<usize>,
    ) -> BenchResult<Duration> {
        if repetitions == 0 {
            return Err(BenchError::ZeroRepetitions);
        }
        if self.dataset.columns().is_empty() {
            return Err(BenchError::EmptySchema);
        }

        self.prepare()?;

        let columns = self.dataset.columns();
        let types = self.dataset.column_types();
        let target = InsertTarget {
            table: &self.table,
            columns,
        };
        let options = InsertOptions {
            chunk_size,
            temp_dir: &self.temp_dir,
        };

        let mut conn = self.db.connect()?;
        let watch = Stopwatch::start();
        for rep in 0..repetitions {
            db::replace_table(&conn, &self.table, columns, &types)?;
            let inserted = strategy.insert(&mut conn, &target, self.dataset.rows(), &options)?;
            log::debug!("{strategy}: repetition {}/{repetitions} inserted {inserted} rows", rep + 1);
        }
        let average = watch.elapsed().per(repetitions);
        let rows = db::row_count(&conn, &self.table)?;
        drop(conn);

        log::info!(
            "{strategy}: {:.3} ms cpu, {:.3} ms wall per run ({} rows, {repetitions} reps)",
            average.cpu.as_secs_f64() * 1e3,
            average.wall.as_secs_f64() * 1e3,
            rows
        );

        self.log.record(TrialResult {
            strategy,
            repetitions,
            average_duration: average.cpu,
            average_wall_duration: average.wall,
            rows,
        });
        Ok(average.cpu)
    }

    /// Run every strategy in menu order. A failing strategy is logged and
    /// recorded as a failure; the rest still run.
    pub fn run_comparison(&mut self) -> &BenchmarkLog {
        for strategy in Strategy::ALL {
            if let Err(e) = self.time_strategy(strategy, self.repetitions, self.chunk_size) {
                log::error!("{strategy} failed against `{}`: {e}", self.table);
                self.log.record_failure(strategy, &e);
            }
        }
        &self.log
    }

    pub fn log(&self) -> &BenchmarkLog {
        &self.log
    }

    pub fn into_log(self) -> BenchmarkLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(strategy: Strategy, ms: u64) -> TrialResult {
        TrialResult {
            strategy,
            repetitions: 1,
            average_duration: Duration::from_millis(ms),
            average_wall_duration: Duration::from_millis(ms),
            rows: 0,
        }
    }

    #[test]
    fn rerun_overwrites_in_place() {
        let mut log = BenchmarkLog::default();
        log.record(result(Strategy::RowByRow, 5));
        log.record(result(Strategy::CopyBuffer, 2));
        log.record(result(Strategy::RowByRow, 7));

        assert_eq!(log.len(), 2);
        assert_eq!(log.results()[0].strategy, Strategy::RowByRow);
        assert_eq!(log.results()[0].average_duration, Duration::from_millis(7));
        assert_eq!(log.results()[1].strategy, Strategy::CopyBuffer);
    }

    #[test]
    fn failure_replaces_result_and_success_clears_failure() {
        let mut log = BenchmarkLog::default();
        log.record(result(Strategy::InlineValues, 3));
        log.record_failure(
            Strategy::InlineValues,
            &BenchError::MissingTable("t".into()),
        );
        assert!(log.get(Strategy::InlineValues).is_none());
        assert_eq!(log.failures().len(), 1);

        log.record(result(Strategy::InlineValues, 4));
        assert!(log.failures().is_empty());
        assert!(log.get(Strategy::InlineValues).is_some());
    }
}
