// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tessera_scene --heading-base-level=0

//! Tessera Scene: per-page spatial indices kept in sync with a canvas of shapes.
//!
//! Tessera Scene is the derived spatial layer of an infinite-canvas editor. Shapes live in an
//! external record store; this crate consumes its committed mutations and keeps a region-query
//! index per page correct as shapes move, resize, nest, and bind to each other.
//!
//! - Primitives, groups (bounds = union of children), frames (own box), and connectors whose
//!   endpoints can be anchored to other shapes.
//! - Page-space bounds are derived from the parent chain's transforms; a change propagates to
//!   descendants, enclosing groups, and bound connectors within the same batch.
//! - Each batch is all-or-nothing: either every index reflects it after
//!   [`Scene::apply`] returns, or the batch is rejected and nothing changed.
//! - Region queries per page via [`Scene::query`], exact and in ascending [`ShapeId`] order.
//!
//! ## Not a renderer or a record store
//!
//! This crate does not own shapes, persist anything, or draw. It keeps the latest record of each
//! shape only to derive relations and recompute bounds. Bounds are conservative axis-aligned boxes:
//! rotated shapes get the box of their rotated corners, and connectors are the box spanning their
//! endpoints with no stroke padding.
//!
//! ## Integration with Tessera Index
//!
//! Each page owns a [`tessera_index::GridIndex`] keyed by [`ShapeId`]. Writes for a batch are
//! staged and committed once per touched page, and the resulting [`tessera_index::Damage`] is
//! returned in the [`BatchReport`].
//!
//! ## API overview
//!
//! - [`Scene`]: records, relations, cached bounds, and page indices.
//! - [`Mutation`]: the consumed feed (`Create`, `Update`, `Reparent`, `Delete`).
//! - [`PageEvent`]: page lifecycle (`Created`, `Deleted`, `Activated`).
//! - [`ShapeRecord`] / [`ShapeKind`] / [`Terminal`]: what a shape is.
//! - [`compute_bounds`] and [`invalidation_order`]: the pure pieces, usable on their own.
//! - `SharedScene` (feature `std`): the scene behind a `parking_lot` read-write lock.
//!
//! ## Logging
//!
//! Batches run inside a `debug` span named `apply`. Page lifecycle and dangling references are
//! logged at `debug`, each recomputed shape at `trace`, and rejected batches at `warn`. Install
//! any `tracing` subscriber to see them.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use tessera_scene::{Mutation, PageId, Scene, ShapeId, ShapeKind, ShapeRecord, Terminal};
//!
//! let page = PageId(1);
//! let mut scene = Scene::new();
//!
//! // A box and an arrow pointing at its center.
//! scene
//!     .apply(&[
//!         Mutation::Create {
//!             id: ShapeId(1),
//!             record: ShapeRecord::new(page, ShapeKind::rect(100.0, 100.0)).at(200.0, 200.0),
//!         },
//!         Mutation::Create {
//!             id: ShapeId(2),
//!             record: ShapeRecord::new(
//!                 page,
//!                 ShapeKind::Connector {
//!                     start: Terminal::at(Point::ZERO),
//!                     end: Terminal::bound(Point::ZERO, ShapeId(1), Point::new(0.5, 0.5)),
//!                 },
//!             ),
//!         },
//!     ])
//!     .unwrap();
//! assert_eq!(scene.bounds(ShapeId(2)), Some(Rect::new(0.0, 0.0, 250.0, 250.0)));
//!
//! // Moving the box drags the arrow along in the same batch.
//! scene
//!     .apply(&[Mutation::Update {
//!         id: ShapeId(1),
//!         record: ShapeRecord::new(page, ShapeKind::rect(100.0, 100.0)).at(-200.0, 200.0),
//!     }])
//!     .unwrap();
//! assert_eq!(scene.bounds(ShapeId(2)), Some(Rect::new(-150.0, 0.0, 0.0, 250.0)));
//! assert!(scene.query(page, Rect::new(200.0, 200.0, 300.0, 300.0)).is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bounds;
pub mod error;
pub mod pages;
pub mod propagate;
pub mod resolve;
pub mod scene;
#[cfg(feature = "std")]
pub mod shared;
pub mod types;

pub use bounds::{Resolved, compute_bounds, transform_rect_bbox, union_all};
pub use error::{SceneError, StructureError};
pub use pages::{PageIndex, PageIndices};
pub use propagate::BatchReport;
pub use resolve::{DependencyGraph, invalidation_order};
pub use scene::{Scene, SceneConfig};
#[cfg(feature = "std")]
pub use shared::SharedScene;
pub use types::{
    Binding, ChangeFlags, Mutation, PageEvent, PageId, ShapeId, ShapeKind, ShapeRecord, Terminal,
};
