use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use meta_conform::conformance::{ColumnPolicy, Conformance, OnError};
use meta_conform::dataset::{ColumnData, Dataset};
use meta_conform::metadata::{ColumnMeta, DataFormat, TableMetadata};
use meta_conform::types::ColumnType;

fn orders_metadata() -> TableMetadata {
    let mut metadata =
        TableMetadata::new("orders", DataFormat::Csv, "orders").expect("valid metadata");
    for (name, ty) in [
        ("id", ColumnType::Long),
        ("ordered_at", ColumnType::Date),
        ("amount", ColumnType::Float),
        ("status", ColumnType::Character),
        ("paid", ColumnType::Boolean),
    ] {
        metadata
            .push_column(ColumnMeta::new(name, ty))
            .expect("unique column");
    }
    metadata
}

fn text(rows: usize, cell: impl Fn(usize) -> String) -> ColumnData {
    ColumnData::String((0..rows).map(|i| Some(cell(i))).collect())
}

fn raw_orders(rows: usize) -> Dataset {
    Dataset::from_columns([
        ("status", text(rows, |i| ["shipped", "pending", "processing"][i % 3].to_string())),
        ("amount", text(rows, |i| format!("{}.{:02}", i % 500, i % 100))),
        ("id", text(rows, |i| i.to_string())),
        ("note", text(rows, |_| "n/a".to_string())),
        ("ordered_at", text(rows, |i| format!("2024-01-{:02}", (i % 28) + 1))),
        ("paid", text(rows, |i| (i % 2 == 0).to_string())),
    ])
    .expect("consistent columns")
}

fn conformance_benchmarks(c: &mut Criterion) {
    let metadata = orders_metadata();
    let engine = Conformance::default();
    let raw = raw_orders(20_000);

    c.bench_function("impose_exact_conformance_20k", |b| {
        b.iter_batched(
            || raw.clone(),
            |mut dataset| {
                engine
                    .impose_exact_conformance(&mut dataset, &metadata)
                    .expect("conform");
                dataset
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("impose_data_types_best_effort_20k", |b| {
        b.iter_batched(
            || {
                let mut dataset = raw.clone();
                engine
                    .impose_column_order(&mut dataset, &metadata, ColumnPolicy::exact())
                    .expect("reorder");
                dataset
            },
            |mut dataset| {
                engine
                    .impose_data_types(&mut dataset, &metadata, OnError::BestEffort)
                    .expect("convert")
            },
            BatchSize::LargeInput,
        )
    });

    let mut conformed = raw.clone();
    engine
        .impose_exact_conformance(&mut conformed, &metadata)
        .expect("conform");
    c.bench_function("check_exact_conformance_20k", |b| {
        b.iter(|| engine.exactly_conforms(&conformed, &metadata).expect("check"))
    });
}

criterion_group!(benches, conformance_benchmarks);
criterion_main!(benches);
