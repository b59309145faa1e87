//! Integration tests: drive the harness end to end against real SQLite files.

use bench_core::dataset::{Dataset, Value};
use bench_core::synth::{generate, DEFAULT_SEED};
use insert_bench::copy::TEMP_FILE_PREFIX;
use insert_bench::db::{self, ConnectionSettings, Database, Durability, MEMORY};
use insert_bench::{BenchError, InsertionBenchmark, Strategy};
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    db: Database,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bench.sqlite3");
        let db = Database::open(path.to_str().unwrap(), ConnectionSettings::default())
            .expect("open database");
        Self { dir, db }
    }

    fn bench<'a>(&'a self, dataset: &'a Dataset) -> InsertionBenchmark<'a> {
        InsertionBenchmark::new(&self.db, dataset).with_temp_dir(self.dir.path())
    }

    fn row_count(&self) -> u64 {
        let conn = self.db.connect().unwrap();
        db::row_count(&conn, "test_table").unwrap()
    }

    fn table_exists(&self) -> bool {
        let conn = self.db.connect().unwrap();
        db::table_exists(&conn, "test_table").unwrap()
    }

    fn leftover_copy_files(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_FILE_PREFIX))
            .count()
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn row_by_row_hundred_rows_five_reps() {
    let fx = Fixture::new();
    let dataset = generate(100, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset);

    let avg = bench.time_strategy(Strategy::RowByRow, 5, None).unwrap();
    assert!(avg >= Duration::ZERO);

    let entry = bench.log().get(Strategy::RowByRow).unwrap();
    assert_eq!(entry.repetitions, 5);
    assert_eq!(entry.average_duration, avg);
    assert_eq!(entry.rows, 100);
    assert_eq!(fx.row_count(), 100);
}

#[test]
fn empty_dataset_runs_every_strategy() {
    let fx = Fixture::new();
    let dataset = generate(0, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset).with_repetitions(2);

    let log = bench.run_comparison();
    assert!(log.failures().is_empty(), "{:?}", log.failures());
    assert_eq!(log.len(), Strategy::ALL.len());
    for result in log.results() {
        assert_eq!(result.rows, 0, "{}", result.strategy);
    }
    assert_eq!(fx.row_count(), 0);
}

#[test]
fn every_strategy_round_trips_the_row_count() {
    let fx = Fixture::new();
    let dataset = generate(137, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset);

    for strategy in Strategy::ALL {
        let avg = bench.time_strategy(strategy, 2, Some(25)).unwrap();
        assert!(avg >= Duration::ZERO);
        assert_eq!(fx.row_count(), 137, "{strategy}");
    }
}

#[test]
fn comparison_runs_in_menu_order() {
    let fx = Fixture::new();
    let dataset = generate(20, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset).with_repetitions(1);

    let order: Vec<Strategy> = bench
        .run_comparison()
        .results()
        .iter()
        .map(|r| r.strategy)
        .collect();
    assert_eq!(order, Strategy::ALL.to_vec());
}

#[test]
fn in_memory_database_keeps_rows_between_trials() {
    let db = Database::open(MEMORY, ConnectionSettings::default()).unwrap();
    let dataset = generate(50, DEFAULT_SEED).unwrap();
    let mut bench = InsertionBenchmark::new(&db, &dataset);

    bench.time_strategy(Strategy::CopyBuffer, 3, None).unwrap();
    let conn = db.connect().unwrap();
    assert_eq!(db::row_count(&conn, "test_table").unwrap(), 50);
}

// ── prepare ─────────────────────────────────────────────────────────

#[test]
fn prepare_is_idempotent() {
    let fx = Fixture::new();
    let dataset = generate(10, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset);

    bench.prepare().unwrap();
    bench.prepare().unwrap();
    assert!(!fx.table_exists());

    bench.time_strategy(Strategy::ExecuteMany, 1, None).unwrap();
    assert!(fx.table_exists());
    bench.prepare().unwrap();
    assert!(!fx.table_exists());
    bench.prepare().unwrap();
}

// ── Temp file cleanup ───────────────────────────────────────────────

#[test]
fn temp_file_copy_leaves_no_files() {
    let fx = Fixture::new();
    let dataset = generate(200, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset);

    bench.time_strategy(Strategy::CopyTempFile, 3, None).unwrap();
    assert_eq!(fx.leftover_copy_files(), 0);
    assert_eq!(fx.row_count(), 200);
}

// ── Unlogged variant ────────────────────────────────────────────────

#[test]
fn unlogged_copy_restores_durability() {
    let fx = Fixture::new();
    let dataset = generate(100, DEFAULT_SEED).unwrap();
    let before = Durability::read(&fx.db.connect().unwrap()).unwrap();

    let mut bench = fx.bench(&dataset);
    bench
        .time_strategy(Strategy::CopyBufferUnlogged, 3, None)
        .unwrap();

    // Connections re-apply their settings, so check the file itself too:
    // WAL mode is persistent and must survive the trial.
    let conn = rusqlite::Connection::open(fx.dir.path().join("bench.sqlite3")).unwrap();
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |r| r.get(0))
        .unwrap();
    assert_eq!(mode, before.journal_mode);
    drop(conn);

    bench.time_strategy(Strategy::CopyBuffer, 2, None).unwrap();
    assert_eq!(fx.row_count(), 100);
}

#[test]
fn later_strategies_behave_the_same_after_unlogged() {
    let dataset = generate(64, DEFAULT_SEED).unwrap();

    let plain = Fixture::new();
    let mut bench = plain.bench(&dataset);
    bench.time_strategy(Strategy::ExecuteMany, 2, None).unwrap();
    let plain_rows = plain.row_count();

    let after = Fixture::new();
    let mut bench = after.bench(&dataset);
    bench
        .time_strategy(Strategy::CopyBufferUnlogged, 2, None)
        .unwrap();
    bench.prepare().unwrap();
    bench.time_strategy(Strategy::ExecuteMany, 2, None).unwrap();

    assert_eq!(after.row_count(), plain_rows);
    assert_eq!(
        Durability::read(&after.db.connect().unwrap()).unwrap(),
        Durability::read(&plain.db.connect().unwrap()).unwrap()
    );
}

// ── Failure handling ────────────────────────────────────────────────

#[test]
fn failing_strategy_does_not_stop_the_menu() {
    let fx = Fixture::new();
    // A non-finite real binds fine but has no SQL literal spelling, so only
    // the inlined-literal strategies fail.
    let dataset = Dataset::new(
        vec!["n".to_string(), "x".to_string()],
        vec![
            vec![Value::Integer(1), Value::Real(f64::INFINITY)],
            vec![Value::Integer(2), Value::Real(1.5)],
        ],
    )
    .unwrap();
    let mut bench = fx.bench(&dataset).with_repetitions(1);

    let log = bench.run_comparison();
    let failed: Vec<Strategy> = log.failures().iter().map(|f| f.strategy).collect();
    assert_eq!(failed, vec![Strategy::InlineValues, Strategy::PagedValues]);
    assert_eq!(log.len(), Strategy::ALL.len() - 2);
    assert!(log.get(Strategy::CopyBufferUnlogged).is_some());
}

#[test]
fn zero_repetitions_is_rejected() {
    let fx = Fixture::new();
    let dataset = generate(5, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset);

    let err = bench.time_strategy(Strategy::RowByRow, 0, None).unwrap_err();
    assert!(matches!(err, BenchError::ZeroRepetitions));
    assert!(bench.log().is_empty());
}

#[test]
fn empty_schema_is_rejected() {
    let fx = Fixture::new();
    let dataset = Dataset::new(Vec::new(), Vec::new()).unwrap();
    let mut bench = fx.bench(&dataset);

    let err = bench.time_strategy(Strategy::CopyBuffer, 1, None).unwrap_err();
    assert!(matches!(err, BenchError::EmptySchema));
}

#[test]
fn custom_table_name() {
    let fx = Fixture::new();
    let dataset = generate(12, DEFAULT_SEED).unwrap();
    let mut bench = fx.bench(&dataset).with_table("select");

    bench.time_strategy(Strategy::MultiRowParams, 1, None).unwrap();
    let conn = fx.db.connect().unwrap();
    assert_eq!(db::row_count(&conn, "select").unwrap(), 12);
    assert!(!db::table_exists(&conn, "test_table").unwrap());
}
