// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One spatial index per page.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::Rect;
use tessera_index::{GridConfig, GridIndex};

use crate::bounds::rect_to_aabb;
use crate::types::{PageId, ShapeId};

/// Spatial index holding the page-space bounds of one page's shapes.
pub type PageIndex = GridIndex<ShapeId>;

/// Registry of page indices plus the active-page pointer.
///
/// Indices are created lazily, the first time a shape lands on a page, or
/// eagerly via [`create_page`](Self::create_page). Pages never share an index,
/// so a query against one page cannot see shapes from another.
#[derive(Debug)]
pub struct PageIndices {
    grid: GridConfig,
    indices: BTreeMap<PageId, PageIndex>,
    active: Option<PageId>,
}

impl PageIndices {
    /// An empty registry whose indices use `grid`.
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            indices: BTreeMap::new(),
            active: None,
        }
    }

    /// Ensure `page` has an index. Returns `false` if it already had one.
    pub fn create_page(&mut self, page: PageId) -> bool {
        if self.indices.contains_key(&page) {
            return false;
        }
        self.indices.insert(page, PageIndex::with_grid(self.grid));
        true
    }

    /// Drop `page`'s index. Clears the active pointer if it pointed there.
    ///
    /// Returns the shapes that were indexed on the page.
    pub fn delete_page(&mut self, page: PageId) -> Vec<ShapeId> {
        if self.active == Some(page) {
            self.active = None;
        }
        self.indices
            .remove(&page)
            .map(|idx| idx.keys().collect())
            .unwrap_or_default()
    }

    /// The index for `page`, created empty if it does not exist yet.
    pub fn index_for_page(&mut self, page: PageId) -> &mut PageIndex {
        let grid = self.grid;
        self.indices
            .entry(page)
            .or_insert_with(|| PageIndex::with_grid(grid))
    }

    /// The index for `page`, if one exists.
    pub fn index(&self, page: PageId) -> Option<&PageIndex> {
        self.indices.get(&page)
    }

    pub(crate) fn index_mut(&mut self, page: PageId) -> Option<&mut PageIndex> {
        self.indices.get_mut(&page)
    }

    /// Make `page` the one [`query_active`](Self::query_active) answers for.
    pub fn set_active_page(&mut self, page: PageId) {
        self.active = Some(page);
    }

    /// The page the user is looking at, if any.
    pub fn active_page(&self) -> Option<PageId> {
        self.active
    }

    /// Pages that currently have an index, ascending.
    pub fn pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.indices.keys().copied()
    }

    /// Shapes on `page` whose committed bounds intersect or touch `rect`,
    /// ascending by id. Unknown pages yield nothing.
    pub fn query(&self, page: PageId, rect: Rect) -> Vec<ShapeId> {
        let Some(idx) = self.indices.get(&page) else {
            return Vec::new();
        };
        idx.query_rect(rect_to_aabb(rect)).map(|(id, _)| id).collect()
    }

    /// [`query`](Self::query) against the active page.
    pub fn query_active(&self, rect: Rect) -> Vec<ShapeId> {
        match self.active {
            Some(page) => self.query(page, rect),
            None => Vec::new(),
        }
    }
}

impl Default for PageIndices {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}
