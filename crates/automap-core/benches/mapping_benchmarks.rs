//! Benchmarks for the mapping hot path
//!
//! Plan building and compilation happen once per shape pair; these
//! benchmarks measure both the first build and the cached execution path.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use automap_core::{
    AutoMapper, ClassShape, MapOptions, MemberDecl, ShapeCatalog, ShapeId, TypeDescriptor, Value,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn ty(text: &str) -> TypeDescriptor {
    text.parse().unwrap()
}

fn create_shapes() -> ShapeCatalog {
    let order = |name: &str, line: &str| {
        ClassShape::new(name)
            .member(MemberDecl::new("id", ty("int")))
            .member(MemberDecl::new("customer", ty("string")))
            .member(MemberDecl::new("placedAt", ty("datetime")))
            .member(MemberDecl::new("lines", ty(&format!("list<{}>", line))))
            .member(MemberDecl::new("note", ty("?string")))
    };
    let line = |name: &str| {
        ClassShape::new(name)
            .member(MemberDecl::new("sku", ty("string")))
            .member(MemberDecl::new("quantity", ty("int")))
            .member(MemberDecl::new("price", ty("float")))
    };
    ShapeCatalog::new()
        .with_class(order("Order", "Line"))
        .unwrap()
        .with_class(order("OrderDto", "LineDto"))
        .unwrap()
        .with_class(line("Line"))
        .unwrap()
        .with_class(line("LineDto"))
        .unwrap()
}

fn create_order(lines: usize) -> Value {
    let lines = (0..lines)
        .map(|i| {
            Value::object(
                "Line",
                [
                    ("sku", Value::String(format!("SKU-{}", i))),
                    ("quantity", Value::Int(i as i64 % 7 + 1)),
                    ("price", Value::Float(i as f64 * 1.5 + 10.0)),
                ],
            )
        })
        .collect();
    Value::object(
        "Order",
        [
            ("id", Value::Int(42)),
            ("customer", Value::from("ACME")),
            (
                "placedAt",
                Value::DateTime(
                    chrono::DateTime::parse_from_rfc3339("2024-05-01T10:00:00+02:00").unwrap(),
                ),
            ),
            ("lines", Value::List(lines)),
            ("note", Value::Null),
        ],
    )
}

fn bench_first_build(c: &mut Criterion) {
    let shapes = create_shapes();
    c.bench_function("build_order_mapper", |b| {
        b.iter(|| {
            let mapper = AutoMapper::new(shapes.clone());
            let result = mapper.get_mapper(&ShapeId::class("Order"), &ShapeId::class("OrderDto"));
            black_box(result.is_ok())
        })
    });
}

fn bench_class_to_class(c: &mut Criterion) {
    let mut group = c.benchmark_group("class_to_class");
    let mapper = AutoMapper::new(create_shapes());
    let options = MapOptions::default();

    for size in [1usize, 10, 100] {
        let order = create_order(size);
        group.bench_with_input(BenchmarkId::new("lines", size), &order, |b, order| {
            b.iter(|| {
                let result = mapper.map(black_box(order), "OrderDto", &options);
                black_box(result)
            })
        });
    }

    group.finish();
}

fn bench_class_to_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("class_to_map");
    let mapper = AutoMapper::new(create_shapes());
    let options = MapOptions::default();
    let order = create_order(10);

    group.bench_function("to_map", |b| {
        b.iter(|| black_box(mapper.map(black_box(&order), ShapeId::Map, &options)))
    });

    let map = mapper.map(&order, ShapeId::Map, &options).unwrap();
    group.bench_function("from_map", |b| {
        b.iter(|| black_box(mapper.map(black_box(&map), "Order", &options)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_first_build,
    bench_class_to_class,
    bench_class_to_map
);
criterion_main!(benches);
