//! SQLite Bulk-Insert Benchmark
//!
//! Times a fixed menu of row-insertion strategies against a scratch table and
//! reports the mean process CPU time (and wall time) per strategy:
//!
//! - row-by-row autocommit inserts
//! - multi-row parameterised inserts
//! - the copy protocol, fed from a temp file, a memory buffer, or a memory
//!   buffer with journaling switched off
//! - a reused prepared statement, one inlined multi-row INSERT, and inlined
//!   inserts paged into bounded statements
//!
//! Run the comparison: `cargo run --release --bin insert-bench`
//! Generate CSV datasets: `cargo run --release --bin gen_data`
//! Run benchmarks: `cargo bench`
//! Run tests: `cargo test`

pub mod config;
pub mod copy;
pub mod db;
pub mod error;
pub mod harness;
pub mod report;
pub mod sql;
pub mod strategy;
pub mod timing;

pub use error::{BenchError, BenchResult};
pub use harness::{BenchmarkLog, InsertionBenchmark, TrialResult};
pub use strategy::Strategy;
