// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pages: isolated indices, switching, migration, and deletion.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tessera_demos --example scene_pages`

use kurbo::Rect;
use tessera_scene::{Mutation, PageEvent, PageId, SharedScene, ShapeId, ShapeKind, ShapeRecord};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (a, b) = (PageId(1), PageId(2));
    let scene = SharedScene::default();
    scene.handle_page_event(PageEvent::Created(a));
    scene.handle_page_event(PageEvent::Created(b));

    let shape = |page| ShapeRecord::new(page, ShapeKind::rect(50.0, 50.0));
    scene
        .apply(&[
            Mutation::Create {
                id: ShapeId(1),
                record: shape(a),
            },
            Mutation::Create {
                id: ShapeId(2),
                record: shape(b),
            },
        ])
        .unwrap();

    let here = Rect::new(0.0, 0.0, 10.0, 10.0);
    for page in [a, b] {
        scene.handle_page_event(PageEvent::Activated(page));
        println!("{page} visible: {:?}", scene.query_active(here));
    }

    // Move shape 1 to page b: removed from a's index, inserted into b's, in one batch.
    let report = scene
        .apply(&[Mutation::Update {
            id: ShapeId(1),
            record: shape(b),
        }])
        .unwrap();
    for (page, damage) in &report.damage {
        println!(
            "{page}: +{} -{} ~{}",
            damage.added.len(),
            damage.removed.len(),
            damage.moved.len()
        );
    }
    println!("{a} now: {:?}", scene.query(a, here));
    println!("{b} now: {:?}", scene.query(b, here));

    scene.handle_page_event(PageEvent::Deleted(b));
    println!("after deleting {b}: {} shapes left", scene.read().len());
}
