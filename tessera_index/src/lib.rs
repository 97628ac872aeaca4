// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tessera_index --heading-base-level=0

//! Tessera Index: an exact 2D AABB index keyed by caller identity.
//!
//! Tessera Index is the spatial building block behind per-page canvas queries.
//!
//! - Insert, update, and remove axis-aligned bounding boxes (AABBs) under a caller-chosen key.
//! - Query by point or intersecting rectangle. Results are exact (no false positives or
//!   negatives), include boxes that merely touch the query, and come back in key order.
//! - Stage a batch of writes and apply them with [`IndexGeneric::commit`], receiving coarse
//!   damage (added/removed/moved boxes). Queries see only committed state.
//!
//! It does not depend on any geometry crate. Higher layers (like a scene of shapes) compute
//! page-space AABBs and feed them here.
//!
//! Backends are pluggable via the [`Backend`] trait. The default is a flat vector (linear
//! scan); [`GridF64`] is a uniform grid with on-demand cells that handles negative
//! coordinates and very large boxes.
//!
//! # Example
//!
//! ```rust
//! use tessera_index::{Aabb2D, Index};
//!
//! let mut idx: Index<i64, u32> = Index::new();
//! idx.insert(1, Aabb2D::new(0, 0, 10, 10)).unwrap();
//! idx.insert(2, Aabb2D::new(5, 5, 15, 15)).unwrap();
//! let _damage0 = idx.commit();
//!
//! // Move the first box and commit a damage set.
//! idx.update(1, Aabb2D::new(20, 0, 30, 10)).unwrap();
//! let damage = idx.commit();
//! assert!(!damage.is_empty());
//!
//! // Query a point inside the second box.
//! let hits: Vec<_> = idx.query_point(6, 6).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].0, 2);
//! ```
//!
//! Grid-backed index:
//!
//! ```rust
//! use tessera_index::{Aabb2D, GridConfig, GridIndex};
//!
//! let mut idx: GridIndex<u32> = GridIndex::with_grid(GridConfig { cell_size: 64.0, ..Default::default() });
//! idx.insert(1, Aabb2D::<f64>::from_xywh(-100.0, -100.0, 50.0, 50.0)).unwrap();
//! let _ = idx.commit();
//!
//! // Touching the box's edge counts.
//! let hits: Vec<_> = idx.query_rect(Aabb2D::new(-50.0, -50.0, 0.0, 0.0)).collect();
//! assert_eq!(hits.len(), 1);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds assert.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod damage;
pub mod error;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::grid::{GridConfig, GridF64};
pub use damage::Damage;
pub use error::IndexError;
pub use index::{GridIndex, Index, IndexGeneric};
pub use types::Aabb2D;
