//! Benchmarks for reconciliation and file name parsing.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ratchet::migrate::{Migration, MigrationId, MigrationName, MigrationRecord, reconcile};
use std::hint::black_box;

fn id(n: u64) -> MigrationId {
    format!("{:014}", 20_240_101_000_000 + n)
        .parse()
        .expect("valid identity")
}

fn catalog(len: u64) -> Vec<Migration> {
    (0..len)
        .map(|n| Migration {
            id: id(n),
            description: format!("migration_{}", n),
            path: format!("migrations/{}_migration_{}.sql", id(n), n).into(),
            body: String::new(),
        })
        .collect()
}

/// Ledger covering every other migration, plus a tail of records with no file.
fn records(len: u64) -> Vec<MigrationRecord> {
    (0..len)
        .step_by(2)
        .chain(len..len + len / 10)
        .map(|n| MigrationRecord::new(id(n), format!("migration_{}", n)))
        .collect()
}

/// Benchmark reconciliation at increasing catalog sizes.
fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [10u64, 100, 1_000, 10_000] {
        let catalog = catalog(size);
        let records = records(size);

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(reconcile(black_box(&catalog), black_box(&records))))
        });
    }

    group.finish();
}

/// Benchmark migration file name parsing.
fn bench_parse_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_name");

    group.bench_function("timestamp_with_extension", |b| {
        b.iter(|| black_box(MigrationName::parse(black_box("20240101120000_add_users_table.sql"))))
    });

    group.bench_function("short_without_extension", |b| {
        b.iter(|| black_box(MigrationName::parse(black_box("001_a"))))
    });

    group.bench_function("invalid", |b| {
        b.iter(|| black_box(MigrationName::parse(black_box("README.md"))))
    });

    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_parse_name);
criterion_main!(benches);
