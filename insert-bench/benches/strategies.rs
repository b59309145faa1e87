//! Criterion benchmark harness: measures each insertion strategy at two
//! dataset sizes against an in-memory database.

use bench_core::dataset::Dataset;
use bench_core::synth::{generate, DEFAULT_SEED};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use insert_bench::db::{self, ConnectionSettings, Database, MEMORY};
use insert_bench::strategy::{InsertOptions, InsertTarget, Strategy};
use std::time::Duration;

/// Dataset sizes to benchmark.
fn dataset_sizes() -> Vec<(&'static str, usize)> {
    vec![("df1e2", 100), ("df1e3", 1_000)]
}

fn bench_strategies(c: &mut Criterion) {
    let db = Database::open(MEMORY, ConnectionSettings::default()).expect("open database");
    let temp_dir = std::env::temp_dir();

    let mut group = c.benchmark_group("insert");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for (label, size) in dataset_sizes() {
        let dataset: Dataset = generate(size, DEFAULT_SEED).expect("generate dataset");
        let types = dataset.column_types();
        let target = InsertTarget {
            table: "bench_table",
            columns: dataset.columns(),
        };
        let options = InsertOptions {
            chunk_size: None,
            temp_dir: &temp_dir,
        };

        for strategy in Strategy::ALL {
            let mut conn = db.connect().expect("connect");
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), label),
                &dataset,
                |b, dataset| {
                    b.iter(|| {
                        db::replace_table(&conn, target.table, target.columns, &types)
                            .expect("replace table");
                        strategy
                            .insert(&mut conn, &target, dataset.rows(), &options)
                            .expect("insert failed");
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
