// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index basics.
//!
//! Stage writes, commit them for damage, and query by point and rectangle.
//!
//! Run:
//! - `cargo run -p tessera_demos --example index_basics`

use tessera_index::{Aabb2D, GridConfig, GridIndex};

fn main() {
    let mut idx: GridIndex<u32> = GridIndex::with_grid(GridConfig {
        cell_size: 64.0,
        ..Default::default()
    });
    idx.insert(1, Aabb2D::<f64>::from_xywh(0.0, 0.0, 50.0, 50.0)).unwrap();
    idx.insert(2, Aabb2D::<f64>::from_xywh(40.0, 40.0, 80.0, 80.0)).unwrap();
    // Huge boxes go to the oversize list rather than thousands of cells.
    idx.insert(3, Aabb2D::<f64>::from_xywh(-1e6, -1e6, 2e6, 2e6)).unwrap();

    // Nothing is visible until commit.
    assert_eq!(idx.query_point(10.0, 10.0).count(), 0);
    let damage = idx.commit();
    println!("added: {}", damage.added.len());

    let hits: Vec<u32> = idx.query_point(45.0, 45.0).map(|(k, _)| k).collect();
    println!("point (45, 45) -> {hits:?}");
    assert_eq!(hits, [1, 2, 3]);

    // Move box 1 and look at the damage pair.
    idx.update(1, Aabb2D::<f64>::from_xywh(200.0, 0.0, 50.0, 50.0)).unwrap();
    let damage = idx.commit();
    println!("moved: {:?}", damage.moved);
    println!("damage union: {:?}", damage.union());

    // Touching edges count as intersecting.
    let hits: Vec<u32> = idx
        .query_rect(Aabb2D::new(250.0, 50.0, 300.0, 60.0))
        .map(|(k, _)| k)
        .collect();
    println!("rect touching box 1's corner -> {hits:?}");
    assert_eq!(hits, [1, 3]);
}
