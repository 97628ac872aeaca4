// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use tessera_benches::Rng;
use tessera_scene::{Mutation, PageId, Scene, ShapeId, ShapeKind, ShapeRecord, Terminal};

const PAGE: PageId = PageId(1);

/// One group with `n` children laid out in a row.
fn group_with_children(n: u64) -> Scene {
    let mut scene = Scene::new();
    let mut batch = vec![Mutation::Create {
        id: ShapeId(0),
        record: ShapeRecord::new(PAGE, ShapeKind::Group),
    }];
    for i in 1..=n {
        batch.push(Mutation::Create {
            id: ShapeId(i),
            record: ShapeRecord::new(PAGE, ShapeKind::rect(20.0, 20.0))
                .at(i as f64 * 30.0, 0.0)
                .with_parent(ShapeId(0)),
        });
    }
    let _ = scene.apply(&batch);
    scene
}

/// One hub box with `n` connectors bound to its center.
fn hub_with_connectors(n: u64) -> Scene {
    let mut scene = Scene::new();
    let mut rng = Rng::new(0x5EED_0000_0000_0001);
    let mut batch = vec![Mutation::Create {
        id: ShapeId(0),
        record: ShapeRecord::new(PAGE, ShapeKind::rect(100.0, 100.0)),
    }];
    for i in 1..=n {
        let start = Point::new(rng.next_f64() * 5_000.0, rng.next_f64() * 5_000.0);
        batch.push(Mutation::Create {
            id: ShapeId(i),
            record: ShapeRecord::new(
                PAGE,
                ShapeKind::Connector {
                    start: Terminal::at(start),
                    end: Terminal::bound(Point::ZERO, ShapeId(0), Point::new(0.5, 0.5)),
                },
            ),
        });
    }
    let _ = scene.apply(&batch);
    scene
}

fn bench_group_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_move");
    for &n in &[16u64, 256, 4096] {
        group.throughput(Throughput::Elements(n + 1));
        group.bench_function(format!("children_{n}"), |b| {
            b.iter_batched(
                || group_with_children(n),
                |mut scene| {
                    let moved = ShapeRecord::new(PAGE, ShapeKind::Group).at(500.0, 500.0);
                    let report = scene.apply(&[Mutation::Update {
                        id: ShapeId(0),
                        record: moved,
                    }]);
                    black_box(report.map(|r| r.recomputed.len()).unwrap_or(0));
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_connector_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("connector_fan_in");
    for &n in &[16u64, 256, 4096] {
        group.throughput(Throughput::Elements(n + 1));
        group.bench_function(format!("connectors_{n}"), |b| {
            b.iter_batched(
                || hub_with_connectors(n),
                |mut scene| {
                    let moved = ShapeRecord::new(PAGE, ShapeKind::rect(100.0, 100.0)).at(-300.0, 0.0);
                    let report = scene.apply(&[Mutation::Update {
                        id: ShapeId(0),
                        record: moved,
                    }]);
                    black_box(report.map(|r| r.recomputed.len()).unwrap_or(0));
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_query_after_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_query");
    let mut scene = Scene::new();
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    let batch: Vec<Mutation> = (0..20_000u64)
        .map(|i| Mutation::Create {
            id: ShapeId(i),
            record: ShapeRecord::new(PAGE, ShapeKind::rect(40.0, 30.0))
                .at(rng.next_f64() * 50_000.0, rng.next_f64() * 50_000.0),
        })
        .collect();
    let _ = scene.apply(&batch);
    let viewport = Rect::new(20_000.0, 20_000.0, 21_920.0, 21_080.0);
    group.bench_function("viewport_20k", |b| {
        b.iter(|| black_box(scene.query(PAGE, viewport).len()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_group_move,
    bench_connector_fan_in,
    bench_query_after_batches
);
criterion_main!(benches);
