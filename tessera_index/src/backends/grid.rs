// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend for `f64` coordinates.
//!
//! Every entry is registered in each cell its AABB touches. Entries that would
//! cover more than [`GridConfig::max_cells_per_entry`] cells are kept in a
//! separate oversize list that every query scans, so a single huge shape
//! (a background frame, a long connector) cannot blow up the cell map.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::Aabb2D;

/// Tuning for [`GridF64`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Side length of a square cell, in world units. Must be positive.
    pub cell_size: f64,
    /// X coordinate mapped to the left edge of cell column 0.
    pub origin_x: f64,
    /// Y coordinate mapped to the top edge of cell row 0.
    pub origin_y: f64,
    /// Entries spanning more cells than this go to the oversize list.
    pub max_cells_per_entry: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 256.0,
            origin_x: 0.0,
            origin_y: 0.0,
            max_cells_per_entry: 64,
        }
    }
}

type CellKey = (i64, i64);

/// Inclusive rectangle of cell keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellSpan {
    min: CellKey,
    max: CellKey,
}

impl CellSpan {
    fn count(self) -> u128 {
        let w = (i128::from(self.max.0) - i128::from(self.min.0) + 1).max(0);
        let h = (i128::from(self.max.1) - i128::from(self.min.1) + 1).max(0);
        w.unsigned_abs().saturating_mul(h.unsigned_abs())
    }

    fn contains(self, key: CellKey) -> bool {
        self.min.0 <= key.0 && key.0 <= self.max.0 && self.min.1 <= key.1 && key.1 <= self.max.1
    }

    fn keys(self) -> impl Iterator<Item = CellKey> {
        (self.min.0..=self.max.0).flat_map(move |x| (self.min.1..=self.max.1).map(move |y| (x, y)))
    }
}

#[derive(Clone, Copy, Debug)]
struct Placed {
    aabb: Aabb2D<f64>,
    // None when the entry lives in the oversize list.
    span: Option<CellSpan>,
}

/// Uniform grid backend.
///
/// Cells are created on demand and dropped when they become empty, so
/// negative and sparse coordinates cost nothing extra.
pub struct GridF64 {
    config: GridConfig,
    entries: Vec<Option<Placed>>,
    cells: BTreeMap<CellKey, Vec<usize>>,
    oversize: Vec<usize>,
}

impl Default for GridF64 {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridF64 {
    /// Create a grid backend with the given configuration.
    pub fn new(config: GridConfig) -> Self {
        assert!(config.cell_size > 0.0, "cell size must be positive");
        Self {
            config,
            entries: Vec::new(),
            cells: BTreeMap::new(),
            oversize: Vec::new(),
        }
    }

    /// The configuration this grid was built with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    fn floor_to_i64(v: f64) -> i64 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Float-to-int casts saturate; with the saturating step below, cells beyond i64 range collapse onto the edge cell."
        )]
        let i = v as i64;
        if (i as f64) > v { i.saturating_sub(1) } else { i }
    }

    fn key_for(&self, x: f64, y: f64) -> CellKey {
        let cs = self.config.cell_size;
        let cx = Self::floor_to_i64((x - self.config.origin_x) / cs);
        let cy = Self::floor_to_i64((y - self.config.origin_y) / cs);
        (cx, cy)
    }

    fn span_for(&self, a: &Aabb2D<f64>) -> CellSpan {
        CellSpan {
            min: self.key_for(a.min_x, a.min_y),
            max: self.key_for(a.max_x, a.max_y),
        }
    }

    fn place(&mut self, slot: usize, aabb: Aabb2D<f64>) {
        debug_assert!(!aabb.has_nan(), "NaN coordinates cannot be indexed");
        let span = self.span_for(&aabb);
        let span = if span.count() > u128::from(self.config.max_cells_per_entry) {
            self.oversize.push(slot);
            None
        } else {
            for key in span.keys() {
                self.cells.entry(key).or_default().push(slot);
            }
            Some(span)
        };
        self.entries[slot] = Some(Placed { aabb, span });
    }

    fn unplace(&mut self, slot: usize) {
        let Some(placed) = self.entries.get_mut(slot).and_then(Option::take) else {
            return;
        };
        match placed.span {
            Some(span) => {
                for key in span.keys() {
                    if let Some(slots) = self.cells.get_mut(&key) {
                        if let Some(pos) = slots.iter().position(|&s| s == slot) {
                            slots.swap_remove(pos);
                        }
                        if slots.is_empty() {
                            self.cells.remove(&key);
                        }
                    }
                }
            }
            None => self.oversize.retain(|&s| s != slot),
        }
    }

    fn candidates(&self, span: CellSpan) -> BTreeSet<usize> {
        let mut set = BTreeSet::new();
        if span.count() <= self.cells.len() as u128 {
            for key in span.keys() {
                if let Some(slots) = self.cells.get(&key) {
                    set.extend(slots.iter().copied());
                }
            }
        } else {
            // Wide query: walk the occupied columns instead of every empty cell.
            let lo = (span.min.0, i64::MIN);
            let hi = (span.max.0, i64::MAX);
            for (key, slots) in self.cells.range(lo..=hi) {
                if span.contains(*key) {
                    set.extend(slots.iter().copied());
                }
            }
        }
        set.extend(self.oversize.iter().copied());
        set
    }

    fn aabb(&self, slot: usize) -> Option<&Aabb2D<f64>> {
        self.entries.get(slot)?.as_ref().map(|p| &p.aabb)
    }
}

impl Backend<f64> for GridF64 {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<f64>) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }
        self.unplace(slot);
        self.place(slot, aabb);
    }
    fn update(&mut self, slot: usize, aabb: Aabb2D<f64>) {
        let span = self.span_for(&aabb);
        let Some(Some(placed)) = self.entries.get_mut(slot) else {
            return;
        };
        // Same cells: only the stored box changes.
        if placed.span == Some(span) {
            placed.aabb = aabb;
            return;
        }
        self.unplace(slot);
        self.place(slot, aabb);
    }
    fn remove(&mut self, slot: usize) {
        self.unplace(slot);
    }
    fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.oversize.clear();
    }
    fn query_point<'a>(&'a self, x: f64, y: f64) -> Box<dyn Iterator<Item = usize> + 'a> {
        let key = self.key_for(x, y);
        let set = self.candidates(CellSpan { min: key, max: key });
        Box::new(
            set.into_iter()
                .filter(move |&s| self.aabb(s).is_some_and(|a| a.contains_point(x, y))),
        )
    }
    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = usize> + 'a> {
        debug_assert!(!rect.has_nan(), "NaN query rectangle");
        if rect.is_empty() {
            return Box::new(core::iter::empty());
        }
        let set = self.candidates(self.span_for(&rect));
        Box::new(
            set.into_iter()
                .filter(move |&s| self.aabb(s).is_some_and(|a| a.intersects(&rect))),
        )
    }
}

impl Debug for GridF64 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.entries.len();
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("GridF64")
            .field("config", &self.config)
            .field("total_slots", &total)
            .field("alive", &alive)
            .field("cells", &self.cells.len())
            .field("oversize", &self.oversize.len())
            .finish_non_exhaustive()
    }
}
