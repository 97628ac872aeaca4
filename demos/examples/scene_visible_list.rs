// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-window example over a long page of shapes.
//!
//! Run:
//! - `cargo run -p tessera_demos --example scene_visible_list`

use kurbo::Rect;
use tessera_scene::{Mutation, PageEvent, PageId, Scene, ShapeId, ShapeKind, ShapeRecord};

const ROW_H: f64 = 20.0;
const WIDTH: f64 = 200.0;

fn main() {
    let page = PageId(7);
    let mut scene = Scene::new();
    scene.handle_page_event(PageEvent::Created(page));
    scene.handle_page_event(PageEvent::Activated(page));

    let rows = 1000_u64;
    let batch: Vec<Mutation> = (0..rows)
        .map(|i| Mutation::Create {
            id: ShapeId(i),
            record: ShapeRecord::new(page, ShapeKind::rect(WIDTH, ROW_H - 2.0))
                .at(0.0, i as f64 * ROW_H),
        })
        .collect();
    scene.apply(&batch).unwrap();

    // Simulate a few scroll positions by changing the viewport rectangle
    for scroll in [0.0, 30.0, 200.0, 600.0] {
        let viewport = Rect::new(0.0, scroll, WIDTH, scroll + 100.0);
        let visible: Vec<u64> = scene
            .query_active(viewport)
            .into_iter()
            .map(ShapeId::get)
            .collect();
        println!("scroll={scroll:.1} -> visible rows: {visible:?}");
    }
}
