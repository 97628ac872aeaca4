// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch application: stage records, order the invalidation set, recompute,
//! then write bounds to the cache and page indices.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use tessera_index::{Damage, IndexError};
use tracing::{debug, debug_span, trace, warn};

use crate::bounds::{Resolved, compute_bounds, rect_to_aabb};
use crate::error::{SceneError, StructureError};
use crate::resolve::invalidation_order;
use crate::scene::{Cached, Scene};
use crate::types::{ChangeFlags, Mutation, PageId, ShapeId, ShapeKind, ShapeRecord, Terminal};

/// Outcome of a successful [`Scene::apply`].
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// Shapes whose bounds were recomputed, in recomputation order.
    pub recomputed: Vec<ShapeId>,
    /// Shapes removed from the scene, ascending.
    pub removed: Vec<ShapeId>,
    /// Index damage per touched page. Pages whose index did not change are absent.
    pub damage: BTreeMap<PageId, Damage<f64>>,
}

type Undo = Vec<(ShapeId, Option<ShapeRecord>)>;

struct Pass {
    order: Vec<ShapeId>,
    fresh: BTreeMap<ShapeId, Rect>,
    removed: Vec<ShapeId>,
}

fn mark(changed: &mut BTreeMap<ShapeId, ChangeFlags>, id: ShapeId, flags: ChangeFlags) {
    *changed.entry(id).or_default() |= flags;
}

impl Scene {
    /// Apply one committed batch of mutations.
    ///
    /// Either every mutation takes effect and each affected shape's bounds
    /// and index entry are brought up to date, or the batch is rejected and
    /// the scene is left exactly as it was. Queries issued after this returns
    /// see the whole batch; there is no partially propagated state.
    pub fn apply(&mut self, batch: &[Mutation]) -> Result<BatchReport, SceneError> {
        let span = debug_span!("apply", mutations = batch.len());
        let _enter = span.enter();

        let mut undo = Undo::new();
        let planned = self
            .plan(batch, &mut undo)
            .and_then(|pass| self.check_index_sync(&pass).map(|()| pass));
        let pass = match planned {
            Ok(pass) => pass,
            Err(err) => {
                warn!(%err, "batch rejected");
                for (id, prev) in undo.into_iter().rev() {
                    self.put_record(id, prev);
                }
                return Err(err);
            }
        };
        self.write_back(pass)
    }

    /// Stage every mutation and compute fresh bounds. Touches only records.
    fn plan(&mut self, batch: &[Mutation], undo: &mut Undo) -> Result<Pass, SceneError> {
        let mut changed = BTreeMap::new();
        for m in batch {
            self.stage(m, undo, &mut changed)?;
        }

        let order = invalidation_order(&*self, &changed)?;
        let mut transforms = BTreeMap::new();
        let mut fresh = BTreeMap::new();
        for &id in &order {
            let Some(record) = self.records.get(&id) else {
                continue;
            };
            if let Some(parent) = record.parent
                && let Some(p) = self.records.get(&parent)
                && p.page != record.page
            {
                return Err(StructureError::CrossPageParent { shape: id, parent }.into());
            }
            let page_transform = self.page_transform(id, &mut transforms)?;
            let children: Vec<Rect> = if record.kind.aggregates_children() {
                self.children_of(id)
                    .filter_map(|c| self.current_bounds(c, &fresh))
                    .collect()
            } else {
                Vec::new()
            };
            let (start_target, end_target) = match &record.kind {
                ShapeKind::Connector { start, end } => (
                    self.target_bounds(id, record.page, start, &fresh),
                    self.target_bounds(id, record.page, end, &fresh),
                ),
                _ => (None, None),
            };
            let bounds = compute_bounds(
                record,
                page_transform,
                &Resolved {
                    children: &children,
                    start_target,
                    end_target,
                },
            );
            trace!(shape = %id, ?bounds, "recomputed");
            fresh.insert(id, bounds);
        }

        let removed = changed
            .keys()
            .copied()
            .filter(|id| !self.records.contains_key(id) && self.cache.contains_key(id))
            .collect();
        Ok(Pass {
            order,
            fresh,
            removed,
        })
    }

    fn stage(
        &mut self,
        mutation: &Mutation,
        undo: &mut Undo,
        changed: &mut BTreeMap<ShapeId, ChangeFlags>,
    ) -> Result<(), SceneError> {
        match mutation {
            Mutation::Create { id, record } => {
                if self.records.contains_key(id) {
                    return Err(SceneError::DuplicateShape { shape: *id });
                }
                let prev = self.put_record(*id, Some(record.clone()));
                undo.push((*id, prev));
                mark(changed, *id, ChangeFlags::GEOMETRY | ChangeFlags::PLACEMENT);
            }
            Mutation::Update { id, record } => {
                self.replace(*id, record.clone(), undo, changed)?;
            }
            Mutation::Reparent { id, parent } => {
                let Some(old) = self.records.get(id) else {
                    return Err(SceneError::UnknownShape { shape: *id });
                };
                let record = ShapeRecord {
                    parent: *parent,
                    ..old.clone()
                };
                self.replace(*id, record, undo, changed)?;
            }
            Mutation::Delete { id } => {
                if !self.records.contains_key(id) {
                    return Ok(());
                }
                let mut doomed = alloc::vec![*id];
                let mut seen = BTreeSet::from([*id]);
                let mut i = 0;
                while let Some(&cur) = doomed.get(i) {
                    for c in self.children_of(cur) {
                        if seen.insert(c) {
                            doomed.push(c);
                        }
                    }
                    i += 1;
                }
                for shape in doomed {
                    if let Some(old) = self.put_record(shape, None) {
                        if let Some(p) = old.parent {
                            mark(changed, p, ChangeFlags::GEOMETRY);
                        }
                        undo.push((shape, Some(old)));
                        mark(changed, shape, ChangeFlags::REMOVED);
                    }
                }
            }
        }
        Ok(())
    }

    fn replace(
        &mut self,
        id: ShapeId,
        record: ShapeRecord,
        undo: &mut Undo,
        changed: &mut BTreeMap<ShapeId, ChangeFlags>,
    ) -> Result<(), SceneError> {
        let Some(old) = self.records.get(&id) else {
            return Err(SceneError::UnknownShape { shape: id });
        };
        let flags = ChangeFlags::between(old, &record);
        if flags.is_empty() {
            return Ok(());
        }
        if old.parent != record.parent
            && let Some(p) = old.parent
        {
            // The old container loses a child.
            mark(changed, p, ChangeFlags::GEOMETRY);
        }
        let prev = self.put_record(id, Some(record));
        undo.push((id, prev));
        mark(changed, id, flags);
        Ok(())
    }

    /// Page-space transform of a live shape, memoized for the pass.
    ///
    /// A parent that does not exist contributes the identity, making the
    /// shape a page root.
    fn page_transform(
        &self,
        id: ShapeId,
        memo: &mut BTreeMap<ShapeId, Affine>,
    ) -> Result<Affine, StructureError> {
        let mut chain = Vec::new();
        let mut base = Affine::IDENTITY;
        let mut cur = Some(id);
        while let Some(c) = cur {
            if let Some(&tf) = memo.get(&c) {
                base = tf;
                break;
            }
            let Some(record) = self.records.get(&c) else {
                debug!(shape = %id, parent = %c, "dangling parent; treating as page root");
                break;
            };
            if chain.len() > self.records.len() {
                return Err(StructureError::ParentCycle { shape: id });
            }
            chain.push((c, record.transform));
            cur = record.parent;
        }
        for (c, local) in chain.into_iter().rev() {
            base *= local;
            memo.insert(c, base);
        }
        Ok(base)
    }

    /// Bounds of a live shape as of this pass: freshly computed if it was
    /// recomputed already, otherwise the cached value.
    fn current_bounds(&self, id: ShapeId, fresh: &BTreeMap<ShapeId, Rect>) -> Option<Rect> {
        if !self.records.contains_key(&id) {
            return None;
        }
        fresh
            .get(&id)
            .copied()
            .or_else(|| self.bounds(id))
    }

    fn target_bounds(
        &self,
        connector: ShapeId,
        page: PageId,
        terminal: &Terminal,
        fresh: &BTreeMap<ShapeId, Rect>,
    ) -> Option<Rect> {
        let target = terminal.binding?.target;
        match self.records.get(&target) {
            Some(r) if r.page == page => self.current_bounds(target, fresh),
            Some(_) => {
                debug!(%connector, %target, "binding crosses pages; using literal endpoint");
                None
            }
            None => {
                debug!(%connector, %target, "dangling binding; using literal endpoint");
                None
            }
        }
    }

    /// Move a finished pass into the cache and page indices, committing each
    /// touched index once.
    /// Check that every index write in `pass` will be accepted, before any is staged.
    fn check_index_sync(&self, pass: &Pass) -> Result<(), SceneError> {
        for &id in pass.fresh.keys() {
            let Some(page) = self.page_of(id) else {
                continue;
            };
            let indexed = self.pages.index(page).is_some_and(|idx| idx.contains(id));
            let source = match self.cache.get(&id) {
                Some(prev) if prev.page == page && !indexed => IndexError::UnknownKey,
                Some(prev) if prev.page != page && indexed => IndexError::DuplicateKey,
                None if indexed => IndexError::DuplicateKey,
                _ => continue,
            };
            return Err(SceneError::Index { shape: id, source });
        }
        Ok(())
    }

    fn write_back(&mut self, pass: Pass) -> Result<BatchReport, SceneError> {
        let mut touched = BTreeSet::new();

        for &id in &pass.removed {
            if let Some(old) = self.cache.remove(&id) {
                if let Some(idx) = self.pages.index_mut(old.page) {
                    idx.remove(id);
                }
                touched.insert(old.page);
            }
        }

        for (&id, &bounds) in &pass.fresh {
            let Some(page) = self.page_of(id) else {
                continue;
            };
            let aabb = rect_to_aabb(bounds);
            let index_err = |source| SceneError::Index { shape: id, source };
            match self.cache.get(&id).map(|prev| prev.page) {
                Some(prev) if prev == page => {
                    self.pages
                        .index_for_page(page)
                        .update(id, aabb)
                        .map_err(index_err)?;
                }
                Some(prev) => {
                    self.pages.index_for_page(prev).remove(id);
                    touched.insert(prev);
                    self.pages
                        .index_for_page(page)
                        .insert(id, aabb)
                        .map_err(index_err)?;
                }
                None => {
                    self.pages
                        .index_for_page(page)
                        .insert(id, aabb)
                        .map_err(index_err)?;
                }
            }
            self.cache.insert(id, Cached { page, bounds });
            touched.insert(page);
        }

        let mut damage = BTreeMap::new();
        for page in touched {
            if let Some(idx) = self.pages.index_mut(page) {
                let d = idx.commit();
                if !d.is_empty() {
                    damage.insert(page, d);
                }
            }
        }
        debug!(
            recomputed = pass.order.len(),
            removed = pass.removed.len(),
            pages = damage.len(),
            "batch applied"
        );
        Ok(BatchReport {
            recomputed: pass.order,
            removed: pass.removed,
            damage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    const PAGE: PageId = PageId(1);

    fn create(id: u64, record: ShapeRecord) -> Mutation {
        Mutation::Create {
            id: ShapeId(id),
            record,
        }
    }

    fn rect_at(x: f64, y: f64, w: f64, h: f64) -> ShapeRecord {
        ShapeRecord::new(PAGE, ShapeKind::rect(w, h)).at(x, y)
    }

    #[test]
    fn create_indexes_and_reports_damage() {
        let mut scene = Scene::new();
        let report = scene.apply(&[create(1, rect_at(10.0, 10.0, 5.0, 5.0))]).unwrap();
        assert_eq!(report.recomputed, [ShapeId(1)]);
        assert_eq!(report.damage[&PAGE].added.len(), 1);
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(10.0, 10.0, 15.0, 15.0)));
        assert_eq!(
            scene.query(PAGE, Rect::new(15.0, 15.0, 20.0, 20.0)),
            [ShapeId(1)]
        );
    }

    #[test]
    fn duplicate_create_and_unknown_update_roll_back() {
        let mut scene = Scene::new();
        scene.apply(&[create(1, rect_at(0.0, 0.0, 1.0, 1.0))]).unwrap();
        let err = scene
            .apply(&[
                create(2, rect_at(0.0, 0.0, 1.0, 1.0)),
                create(1, rect_at(5.0, 5.0, 1.0, 1.0)),
            ])
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateShape { shape: ShapeId(1) });
        assert!(scene.record(ShapeId(2)).is_none(), "first create rolled back");
        assert_eq!(scene.len(), 1);

        let err = scene
            .apply(&[Mutation::Reparent {
                id: ShapeId(9),
                parent: None,
            }])
            .unwrap_err();
        assert_eq!(err, SceneError::UnknownShape { shape: ShapeId(9) });
    }

    #[test]
    fn index_desync_is_rejected_before_anything_is_written() {
        let mut scene = Scene::new();
        scene.apply(&[create(1, rect_at(0.0, 0.0, 1.0, 1.0))]).unwrap();
        // An entry the cache knows nothing about.
        let idx = scene.pages.index_for_page(PAGE);
        idx.insert(ShapeId(5), rect_to_aabb(Rect::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        let _ = idx.commit();

        let err = scene
            .apply(&[
                create(2, rect_at(3.0, 3.0, 1.0, 1.0)),
                create(5, rect_at(9.0, 9.0, 1.0, 1.0)),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::Index {
                shape: ShapeId(5),
                source: IndexError::DuplicateKey,
            }
        );
        assert!(scene.record(ShapeId(2)).is_none());
        assert!(scene.record(ShapeId(5)).is_none());
        assert_eq!(scene.bounds(ShapeId(2)), None);
        assert_eq!(scene.bounds(ShapeId(5)), None);
        let idx = scene.pages.index(PAGE).unwrap();
        assert!(!idx.has_pending());
        assert!(!idx.contains(ShapeId(2)));

        // The reverse: the cache holds a shape the index lost.
        scene.pages.index_for_page(PAGE).remove(ShapeId(1));
        let _ = scene.pages.index_for_page(PAGE).commit();
        let err = scene
            .apply(&[Mutation::Update {
                id: ShapeId(1),
                record: rect_at(4.0, 4.0, 1.0, 1.0),
            }])
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::Index {
                shape: ShapeId(1),
                source: IndexError::UnknownKey,
            }
        );
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(scene.record(ShapeId(1)), Some(&rect_at(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn delete_of_unknown_shape_is_noop() {
        let mut scene = Scene::new();
        let report = scene.apply(&[Mutation::Delete { id: ShapeId(4) }]).unwrap();
        assert!(report.recomputed.is_empty() && report.removed.is_empty());
        assert!(report.damage.is_empty());
    }

    #[test]
    fn deleting_group_cascades_and_clears_index() {
        let mut scene = Scene::new();
        scene
            .apply(&[
                create(1, ShapeRecord::new(PAGE, ShapeKind::Group)),
                create(2, rect_at(0.0, 0.0, 10.0, 10.0).with_parent(ShapeId(1))),
                create(3, rect_at(20.0, 0.0, 10.0, 10.0).with_parent(ShapeId(1))),
            ])
            .unwrap();
        let report = scene.apply(&[Mutation::Delete { id: ShapeId(1) }]).unwrap();
        assert_eq!(report.removed, [ShapeId(1), ShapeId(2), ShapeId(3)]);
        assert!(scene.is_empty());
        assert!(scene.query(PAGE, Rect::new(-1e9, -1e9, 1e9, 1e9)).is_empty());
        assert_eq!(scene.bounds(ShapeId(2)), None);
    }

    #[test]
    fn removing_a_child_shrinks_its_group() {
        let mut scene = Scene::new();
        scene
            .apply(&[
                create(1, ShapeRecord::new(PAGE, ShapeKind::Group)),
                create(2, rect_at(0.0, 0.0, 10.0, 10.0).with_parent(ShapeId(1))),
                create(3, rect_at(90.0, 0.0, 10.0, 10.0).with_parent(ShapeId(1))),
            ])
            .unwrap();
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(0.0, 0.0, 100.0, 10.0)));
        scene.apply(&[Mutation::Delete { id: ShapeId(3) }]).unwrap();
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));

        // Reparenting out of the group shrinks it to an empty box at its origin.
        scene
            .apply(&[Mutation::Reparent {
                id: ShapeId(2),
                parent: None,
            }])
            .unwrap();
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(0.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn reparent_under_descendant_is_rejected() {
        let mut scene = Scene::new();
        scene
            .apply(&[
                create(1, ShapeRecord::new(PAGE, ShapeKind::Group)),
                create(2, ShapeRecord::new(PAGE, ShapeKind::Group).with_parent(ShapeId(1))),
            ])
            .unwrap();
        let before = scene.record(ShapeId(1)).cloned();
        let err = scene
            .apply(&[Mutation::Reparent {
                id: ShapeId(1),
                parent: Some(ShapeId(2)),
            }])
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::Structure(StructureError::ParentCycle { .. })
        ));
        assert_eq!(scene.record(ShapeId(1)).cloned(), before);
        assert_eq!(scene.children_of(ShapeId(1)).collect::<Vec<_>>(), [ShapeId(2)]);
    }

    #[test]
    fn cross_page_parent_is_rejected() {
        let mut scene = Scene::new();
        scene
            .apply(&[create(1, ShapeRecord::new(PAGE, ShapeKind::Group))])
            .unwrap();
        let err = scene
            .apply(&[create(
                2,
                ShapeRecord::new(PageId(2), ShapeKind::rect(1.0, 1.0)).with_parent(ShapeId(1)),
            )])
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::Structure(StructureError::CrossPageParent {
                shape: ShapeId(2),
                parent: ShapeId(1),
            })
        );
        assert!(scene.pages().index(PageId(2)).is_none(), "no index touched");
    }

    #[test]
    fn dangling_parent_and_binding_fall_back() {
        let mut scene = Scene::new();
        let connector = ShapeKind::Connector {
            start: Terminal::at(Point::new(0.0, 0.0)),
            end: Terminal::bound(Point::new(40.0, 30.0), ShapeId(99), Point::new(0.5, 0.5)),
        };
        scene
            .apply(&[
                create(1, rect_at(5.0, 5.0, 10.0, 10.0).with_parent(ShapeId(77))),
                create(2, ShapeRecord::new(PAGE, connector)),
            ])
            .unwrap();
        assert_eq!(scene.bounds(ShapeId(1)), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert_eq!(scene.bounds(ShapeId(2)), Some(Rect::new(0.0, 0.0, 40.0, 30.0)));

        // The target appears later: the connector snaps to it in that batch.
        scene.apply(&[create(99, rect_at(100.0, 100.0, 20.0, 20.0))]).unwrap();
        assert_eq!(scene.bounds(ShapeId(2)), Some(Rect::new(0.0, 0.0, 110.0, 110.0)));
    }

    #[test]
    fn page_migration_moves_index_entry() {
        let mut scene = Scene::new();
        scene.apply(&[create(1, rect_at(0.0, 0.0, 10.0, 10.0))]).unwrap();
        let moved = ShapeRecord {
            page: PageId(2),
            ..rect_at(0.0, 0.0, 10.0, 10.0)
        };
        let report = scene
            .apply(&[Mutation::Update {
                id: ShapeId(1),
                record: moved,
            }])
            .unwrap();
        let everywhere = Rect::new(-1e9, -1e9, 1e9, 1e9);
        assert!(scene.query(PAGE, everywhere).is_empty());
        assert_eq!(scene.query(PageId(2), everywhere), [ShapeId(1)]);
        assert_eq!(report.damage[&PAGE].removed.len(), 1);
        assert_eq!(report.damage[&PageId(2)].added.len(), 1);
    }

    #[test]
    fn unchanged_update_touches_nothing() {
        let mut scene = Scene::new();
        scene.apply(&[create(1, rect_at(0.0, 0.0, 10.0, 10.0))]).unwrap();
        let report = scene
            .apply(&[Mutation::Update {
                id: ShapeId(1),
                record: rect_at(0.0, 0.0, 10.0, 10.0),
            }])
            .unwrap();
        assert!(report.recomputed.is_empty());
        assert!(report.damage.is_empty());
    }
}
