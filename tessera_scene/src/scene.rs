// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene state: latest records, derived relations, cached bounds, page indices.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use kurbo::Rect;
use tessera_index::GridConfig;
use tracing::debug;

use crate::pages::PageIndices;
use crate::resolve::DependencyGraph;
use crate::types::{PageEvent, PageId, ShapeId, ShapeRecord};

/// Tuning for a [`Scene`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneConfig {
    /// Grid used by every page index.
    pub grid: GridConfig,
}

/// Committed page-space bounds of a shape and the page whose index holds them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cached {
    pub(crate) page: PageId,
    pub(crate) bounds: Rect,
}

type Relation = BTreeMap<ShapeId, BTreeSet<ShapeId>>;

/// Derived spatial state for a multi-page canvas.
///
/// Feed it committed mutations with [`apply`](Self::apply); read bounds and
/// run region queries in between. Every shape's cached bounds and its entry in
/// its page's index agree after each successful batch.
#[derive(Debug)]
pub struct Scene {
    pub(crate) config: SceneConfig,
    pub(crate) records: BTreeMap<ShapeId, ShapeRecord>,
    // parent -> children; keyed by whatever the child names, live or not.
    pub(crate) children: Relation,
    // binding target -> connectors bound to it.
    pub(crate) binders: Relation,
    pub(crate) cache: BTreeMap<ShapeId, Cached>,
    pub(crate) pages: PageIndices,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene with default configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// An empty scene.
    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
            children: BTreeMap::new(),
            binders: BTreeMap::new(),
            cache: BTreeMap::new(),
            pages: PageIndices::new(config.grid),
        }
    }

    /// The configuration this scene was built with.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of live shapes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no shapes.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest record for `id`.
    pub fn record(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.records.get(&id)
    }

    /// Page `id` lives on.
    pub fn page_of(&self, id: ShapeId) -> Option<PageId> {
        self.records.get(&id).map(|r| r.page)
    }

    /// Current page-space bounds of `id`, or `None` if it does not exist.
    pub fn bounds(&self, id: ShapeId) -> Option<Rect> {
        self.cache.get(&id).map(|c| c.bounds)
    }

    /// Live children of `id`, ascending.
    pub fn children_of(&self, id: ShapeId) -> impl Iterator<Item = ShapeId> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|c| self.records.contains_key(c))
    }

    /// Shapes on `page` whose bounds intersect or touch `rect`, ascending.
    ///
    /// Exact: no shape is missing and none is reported that does not touch
    /// `rect`. Unknown pages yield an empty list.
    pub fn query(&self, page: PageId, rect: Rect) -> Vec<ShapeId> {
        self.pages.query(page, rect)
    }

    /// [`query`](Self::query) against the active page; empty if none is active.
    pub fn query_active(&self, rect: Rect) -> Vec<ShapeId> {
        self.pages.query_active(rect)
    }

    /// The page the user is looking at.
    pub fn active_page(&self) -> Option<PageId> {
        self.pages.active_page()
    }

    /// Per-page indices, read-only.
    pub fn pages(&self) -> &PageIndices {
        &self.pages
    }

    /// React to a page lifecycle notification.
    ///
    /// Deleting a page drops its index and forgets every shape on it. Those
    /// shapes do not appear in any [`BatchReport`](crate::BatchReport).
    pub fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Created(page) => {
                if self.pages.create_page(page) {
                    debug!(%page, "page created");
                }
            }
            PageEvent::Deleted(page) => {
                let doomed: Vec<ShapeId> = self
                    .records
                    .iter()
                    .filter(|(_, r)| r.page == page)
                    .map(|(&id, _)| id)
                    .collect();
                for &id in &doomed {
                    self.put_record(id, None);
                }
                self.cache.retain(|_, c| c.page != page);
                let indexed = self.pages.delete_page(page);
                debug!(
                    %page,
                    shapes = doomed.len(),
                    indexed = indexed.len(),
                    "page deleted"
                );
            }
            PageEvent::Activated(page) => {
                self.pages.set_active_page(page);
                debug!(%page, "page activated");
            }
        }
    }

    /// Replace (or remove) the record for `id`, keeping relations in sync.
    /// Returns the previous record.
    pub(crate) fn put_record(
        &mut self,
        id: ShapeId,
        record: Option<ShapeRecord>,
    ) -> Option<ShapeRecord> {
        let old = match record {
            Some(r) => self.records.insert(id, r),
            None => self.records.remove(&id),
        };
        if let Some(old) = &old {
            unlink(&mut self.children, &mut self.binders, id, old);
        }
        if let Some(new) = self.records.get(&id) {
            link(&mut self.children, &mut self.binders, id, new);
        }
        old
    }
}

fn link(children: &mut Relation, binders: &mut Relation, id: ShapeId, record: &ShapeRecord) {
    if let Some(p) = record.parent {
        children.entry(p).or_default().insert(id);
    }
    for b in record.kind.bindings() {
        binders.entry(b.target).or_default().insert(id);
    }
}

fn unlink(children: &mut Relation, binders: &mut Relation, id: ShapeId, record: &ShapeRecord) {
    fn drop_edge(rel: &mut Relation, from: ShapeId, to: ShapeId) {
        if let Some(set) = rel.get_mut(&from) {
            set.remove(&to);
            if set.is_empty() {
                rel.remove(&from);
            }
        }
    }
    if let Some(p) = record.parent {
        drop_edge(children, p, id);
    }
    for b in record.kind.bindings() {
        drop_edge(binders, b.target, id);
    }
}

impl DependencyGraph for Scene {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.records.contains_key(&id)
    }

    fn parent(&self, id: ShapeId) -> Option<ShapeId> {
        self.records.get(&id).and_then(|r| r.parent)
    }

    fn children(&self, id: ShapeId) -> impl Iterator<Item = ShapeId> + '_ {
        self.children_of(id)
    }

    fn dependents(&self, id: ShapeId, out: &mut Vec<ShapeId>) {
        if let Some(p) = self.parent(id)
            && self
                .records
                .get(&p)
                .is_some_and(|r| r.kind.aggregates_children())
        {
            out.push(p);
        }
        if let Some(connectors) = self.binders.get(&id) {
            out.extend(connectors.iter().copied());
        }
    }
}
