// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_benches::{gen_clustered_rects, gen_grid_rects, gen_random_rects};
use tessera_index::{Aabb2D, GridConfig, GridIndex, Index};

fn grid_index() -> GridIndex<u32> {
    GridIndex::with_grid(GridConfig {
        cell_size: 32.0,
        ..Default::default()
    })
}

fn bench_flatvec(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatvec");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_commit_rect_n{}", n), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(i as u32, r);
                    }
                    let _ = idx.commit();
                    let hits: usize = idx
                        .query_rect(Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0))
                        .count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_commit_rect_n{}", n), |b| {
            b.iter_batched(
                grid_index,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(i as u32, r);
                    }
                    let _ = idx.commit();
                    let hits: usize = idx
                        .query_rect(Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0))
                        .count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    let rects = gen_random_rects(4096, 10_000.0, 12.0, 12.0);
    group.bench_function("insert_commit_rect_random", |b| {
        b.iter_batched(
            grid_index,
            |mut idx| {
                for (i, r) in rects.iter().copied().enumerate() {
                    let _ = idx.insert(i as u32, r);
                }
                let _ = idx.commit();
                let hits: usize = idx
                    .query_rect(Aabb2D::<f64>::from_xywh(-200.0, -200.0, 400.0, 400.0))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_viewport_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_query");
    let rects = gen_clustered_rects(64, 256, 600.0);
    let viewport = Aabb2D::<f64>::from_xywh(8_000.0, 8_000.0, 1920.0, 1080.0);

    let mut flat = Index::<f64, u32>::new();
    let mut grid = GridIndex::<u32>::with_grid(GridConfig::default());
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = flat.insert(i as u32, r);
        let _ = grid.insert(i as u32, r);
    }
    let _ = flat.commit();
    let _ = grid.commit();

    group.bench_function("flatvec", |b| {
        b.iter(|| black_box(flat.query_rect(viewport).count()))
    });
    group.bench_function("grid", |b| {
        b.iter(|| black_box(grid.query_rect(viewport).count()))
    });
    group.finish();
}

fn bench_update_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_churn");
    let rects = gen_random_rects(4096, 10_000.0, 40.0, 40.0);
    let mut grid = GridIndex::<u32>::with_grid(GridConfig::default());
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = grid.insert(i as u32, r);
    }
    let _ = grid.commit();

    // Nudge a tenth of the boxes per commit, like a drag of a multi-selection.
    let mut dx = 0.0;
    group.bench_function("grid_move_10pct_commit", |b| {
        b.iter(|| {
            dx += 1.0;
            for (i, r) in rects.iter().enumerate().step_by(10) {
                let moved = Aabb2D::<f64>::from_xywh(r.min_x + dx, r.min_y, r.width(), r.height());
                let _ = grid.update(i as u32, moved);
            }
            black_box(grid.commit().moved.len())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_flatvec,
    bench_grid,
    bench_viewport_query,
    bench_update_churn
);
criterion_main!(benches);
