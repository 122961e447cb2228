//! Benchmarks for table operators and scheduling
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::HashMap;
use tidyblocks_rs::expr::{CompareOp, Expr};
use tidyblocks_rs::pipeline::{Datasets, NullSinks};
use tidyblocks_rs::{Aggregate, Pipeline, Program, Scheduler, Table, Value};

/// `n` rows of (id, bucket, label) with `buckets` distinct buckets
fn make_table(n: usize, buckets: usize) -> Table {
    let columns = vec!["id".to_string(), "bucket".to_string(), "label".to_string()];
    let rows = (0..n)
        .map(|i| {
            vec![
                Value::from(((i * 7919) % n) as f64),
                Value::from((i % buckets) as f64),
                Value::from(format!("row-{}", i % 97)),
            ]
        })
        .collect();
    Table::new(columns, rows).expect("rows match schema")
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [1_000, 10_000, 100_000].iter() {
        let table = make_table(*size, 16);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("two_keys", size), &table, |b, table| {
            b.iter(|| black_box(table.sort(&["label", "id"]).expect("columns exist")))
        });
    }

    group.finish();
}

fn bench_group_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_summarize");

    for buckets in [4, 256, 4096].iter() {
        let table = make_table(50_000, *buckets);
        group.throughput(Throughput::Elements(50_000));
        group.bench_with_input(BenchmarkId::new("mean", buckets), &table, |b, table| {
            b.iter(|| {
                let grouped = table.group_by("bucket").expect("column exists");
                black_box(
                    grouped
                        .summarize(Aggregate::Mean, "id")
                        .expect("numeric column"),
                )
            })
        });
    }

    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");

    // Pairwise comparison is quadratic, so keep sizes modest
    for size in [100, 500, 2_000].iter() {
        let mut store = HashMap::new();
        store.insert("left".to_string(), make_table(*size, 8));
        store.insert("right".to_string(), make_table(*size, 8));

        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("inner", size), &store, |b, store| {
            b.iter(|| {
                black_box(Table::join(store, "left", "id", "right", "id").expect("tables exist"))
            })
        });
    }

    group.finish();
}

fn bench_scheduler_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");

    for depth in [10, 100].iter() {
        // A chain where stage i waits on stage i - 1, registered in reverse
        let mut program = Program::new();
        for i in (1..*depth).rev() {
            program.push(
                Pipeline::new()
                    .depends_on(format!("stage{}", i - 1))
                    .load("base")
                    .filter(Expr::compare(
                        CompareOp::Geq,
                        Expr::column("bucket"),
                        Expr::number(0.0),
                    ))
                    .notify(format!("stage{}", i)),
            );
        }
        program.push(Pipeline::new().load("base").notify("stage0"));
        let datasets = Datasets::new().with("base", make_table(1_000, 4));

        group.bench_with_input(BenchmarkId::new("chain", depth), &program, |b, program| {
            b.iter(|| {
                let mut scheduler = Scheduler::new().with_datasets(datasets.clone());
                let program = program.clone();
                black_box(
                    scheduler
                        .run(|| Ok(program), &mut NullSinks)
                        .expect("chain runs"),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sort,
    bench_group_summarize,
    bench_join,
    bench_scheduler_chain
);
criterion_main!(benches);
