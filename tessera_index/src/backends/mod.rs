// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple, obviously correct).
//! - `grid`: uniform grid over `f64` coordinates with on-demand cells, negative
//!   coordinates, and an oversize list for entries spanning many cells.

pub mod flatvec;
pub mod grid;

pub use flatvec::FlatVec;
pub use grid::{GridConfig, GridF64};
