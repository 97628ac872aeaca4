// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_benches::{gen_grid_rects, gen_random_rects};
use tessera_index::{Aabb2D, GridConfig, GridIndex};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn to_rstar_rects(v: &[Aabb2D<f64>]) -> Vec<Rectangle<[f64; 2]>> {
    v.iter()
        .map(|r| Rectangle::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]))
        .collect()
}

fn bench_grid_vs_rstar(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_vs_rstar_f64");
    let inputs = [
        ("tiles_n128", gen_grid_rects(128, 10.0)),
        ("random_4096", gen_random_rects(4096, 10_000.0, 40.0, 40.0)),
    ];
    for (name, rects) in &inputs {
        let query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements(rects.len() as u64));

        group.bench_function(format!("tessera_grid_build_query_{name}"), |b| {
            b.iter_batched(
                || GridIndex::<u32>::with_grid(GridConfig::default()),
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(i as u32, r);
                    }
                    let _ = idx.commit();
                    black_box(idx.query_rect(query).count());
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_bulk_{name}"), |b| {
            b.iter_batched(
                || to_rstar_rects(rects),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(
                        [query.min_x, query.min_y],
                        [query.max_x, query.max_y],
                    );
                    black_box(tree.locate_in_envelope_intersecting(&aabb).count());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grid_vs_rstar);
criterion_main!(benches);
