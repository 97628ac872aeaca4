// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene basics.
//!
//! Build a group with two boxes and an arrow bound to one of them, move the
//! group, and watch bounds propagate to children, the group, and the arrow.
//!
//! Run:
//! - `RUST_LOG=tessera_scene=trace cargo run -p tessera_demos --example scene_basics`

use kurbo::{Point, Rect};
use tessera_scene::{Mutation, PageId, Scene, ShapeId, ShapeKind, ShapeRecord, Terminal};
use tracing_subscriber::EnvFilter;

const PAGE: PageId = PageId(1);
const GROUP: ShapeId = ShapeId(1);
const LEFT: ShapeId = ShapeId(2);
const RIGHT: ShapeId = ShapeId(3);
const ARROW: ShapeId = ShapeId(4);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut scene = Scene::new();
    let report = scene
        .apply(&[
            Mutation::Create {
                id: GROUP,
                record: ShapeRecord::new(PAGE, ShapeKind::Group),
            },
            Mutation::Create {
                id: LEFT,
                record: ShapeRecord::new(PAGE, ShapeKind::rect(100.0, 100.0)).with_parent(GROUP),
            },
            Mutation::Create {
                id: RIGHT,
                record: ShapeRecord::new(PAGE, ShapeKind::rect(100.0, 100.0))
                    .at(200.0, 200.0)
                    .with_parent(GROUP),
            },
            Mutation::Create {
                id: ARROW,
                record: ShapeRecord::new(
                    PAGE,
                    ShapeKind::Connector {
                        start: Terminal::at(Point::new(-300.0, 0.0)),
                        end: Terminal::bound(Point::ZERO, RIGHT, Point::new(0.5, 0.5)),
                    },
                ),
            },
        ])
        .unwrap();
    println!("initial order: {:?}", report.recomputed);
    for id in [LEFT, RIGHT, GROUP, ARROW] {
        println!("  {id}: {:?}", scene.bounds(id));
    }

    // Move the group; children, the group, and the bound arrow all follow.
    let report = scene
        .apply(&[Mutation::Update {
            id: GROUP,
            record: ShapeRecord::new(PAGE, ShapeKind::Group).at(1000.0, 0.0),
        }])
        .unwrap();
    println!("after move: {:?}", report.recomputed);
    for (page, damage) in &report.damage {
        println!("  {page} damage: {:?}", damage.union());
    }
    assert_eq!(scene.bounds(GROUP), Some(Rect::new(1000.0, 0.0, 1300.0, 300.0)));
    assert_eq!(scene.bounds(ARROW), Some(Rect::new(-300.0, 0.0, 1250.0, 250.0)));

    let hits = scene.query(PAGE, Rect::new(1000.0, 0.0, 1300.0, 300.0));
    println!("query group area -> {hits:?}");

    // A connector bound to its own enclosing group is a cycle; the batch is rejected.
    let err = scene
        .apply(&[Mutation::Update {
            id: ARROW,
            record: ShapeRecord::new(
                PAGE,
                ShapeKind::Connector {
                    start: Terminal::at(Point::ZERO),
                    end: Terminal::bound(Point::ZERO, GROUP, Point::new(0.5, 0.5)),
                },
            )
            .with_parent(GROUP),
        }])
        .unwrap_err();
    println!("rejected: {err}");
    assert_eq!(scene.bounds(ARROW), Some(Rect::new(-300.0, 0.0, 1250.0, 250.0)));
}
