//! Throughput Benchmark for Redigo
//!
//! Measures the engine's command surface under various workloads. Every
//! run gets a fresh temporary data directory, so the append-only log and
//! snapshot machinery are exercised without touching real data.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use redigo::persist::DataPaths;
use redigo::storage::{Database, Value};
use std::sync::Arc;

fn fresh_db(dir: &tempfile::TempDir) -> Arc<Database> {
    let paths = DataPaths::resolve(Some(dir.path())).unwrap();
    Arc::new(Database::open(paths).unwrap())
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = fresh_db(&dir);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_int", |b| {
        let mut i = 0i64;
        b.iter(|| {
            db.set(&format!("int:{}", i), Value::Int(i), 0).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_string_1k", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024);
        b.iter(|| {
            db.set(&format!("str:{}", i), Value::String(value.clone()), 0)
                .unwrap();
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.set(&format!("ttl:{}", i), Value::Int(1), 3600).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = fresh_db(&dir);

    for i in 0..100_000 {
        db.set(&format!("key:{}", i), Value::Int(i), 0).unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.get(&format!("key:{}", i % 100_000)).ok());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.get(&format!("missing:{}", i)).ok());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the search surfaces
fn bench_search(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = fresh_db(&dir);

    for i in 0..10_000 {
        db.set(&format!("user:{}", i), Value::String(format!("name{}", i % 100)), 0)
            .unwrap();
    }

    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Elements(1));

    group.bench_function("by_value", |b| {
        b.iter(|| black_box(db.search_by_value("name42")));
    });

    group.bench_function("by_prefix", |b| {
        b.iter(|| black_box(db.search_by_key_prefix("user:42")));
    });

    group.bench_function("by_suffix", |b| {
        b.iter(|| black_box(db.search_by_key_suffix(":4242")));
    });

    group.bench_function("by_contains_scan", |b| {
        b.iter(|| black_box(db.search_by_key_contains("4242")));
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = fresh_db(&dir);

    for i in 0..10_000 {
        db.set(&format!("key:{}", i), Value::Int(i), 0).unwrap();
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0i64;
        b.iter(|| {
            if i % 5 == 0 {
                db.set(&format!("new:{}", i), Value::Int(i), 0).unwrap();
            } else {
                black_box(db.get(&format!("key:{}", i % 10_000)).ok());
            }
            i += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_search, bench_mixed);
criterion_main!(benches);
