// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation sets and recomputation order.
//!
//! An edge `A -> B` means "B's bounds are computed from A's bounds":
//!
//! - child -> parent, when the parent aggregates its children (a group);
//! - binding target -> connector.
//!
//! Page transforms flow the other way (parent to child) but do not depend on
//! bounds, so they are not edges. Instead, a shape whose placement changed
//! drags its whole subtree into the seed set.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::error::StructureError;
use crate::types::{ChangeFlags, ShapeId};

/// Read-only view of the relations the resolver walks.
///
/// Identities that are not [`contains`](Self::contains)ed may still be passed
/// to [`dependents`](Self::dependents): a just-deleted shape still has the
/// connectors that were bound to it.
pub trait DependencyGraph {
    /// Number of live shapes.
    fn len(&self) -> usize;

    /// True if there are no live shapes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `id` is live.
    fn contains(&self, id: ShapeId) -> bool;

    /// Parent of a live shape.
    fn parent(&self, id: ShapeId) -> Option<ShapeId>;

    /// Live children of `id`, in ascending order.
    fn children(&self, id: ShapeId) -> impl Iterator<Item = ShapeId> + '_;

    /// Append the live shapes whose bounds are computed from `id`'s bounds.
    fn dependents(&self, id: ShapeId, out: &mut Vec<ShapeId>);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Every live shape that must be recomputed after `changed`, dependencies first.
///
/// Unrelated shapes come out in ascending [`ShapeId`] order, so the result is
/// reproducible for a given graph and change set.
pub fn invalidation_order<G: DependencyGraph>(
    graph: &G,
    changed: &BTreeMap<ShapeId, ChangeFlags>,
) -> Result<Vec<ShapeId>, StructureError> {
    let seeds = widen_seeds(graph, changed)?;
    topo_order(graph, &seeds)
}

/// The changed set plus the subtrees of shapes whose placement changed.
fn widen_seeds<G: DependencyGraph>(
    graph: &G,
    changed: &BTreeMap<ShapeId, ChangeFlags>,
) -> Result<BTreeSet<ShapeId>, StructureError> {
    let mut seeds = BTreeSet::new();
    for (&id, flags) in changed {
        seeds.insert(id);
        if !graph.contains(id) {
            continue;
        }
        check_ancestry(graph, id)?;
        if flags.intersects(ChangeFlags::PLACEMENT | ChangeFlags::PAGE) {
            let mut stack: Vec<ShapeId> = graph.children(id).collect();
            while let Some(c) = stack.pop() {
                if seeds.insert(c) {
                    stack.extend(graph.children(c));
                }
            }
        }
    }
    Ok(seeds)
}

/// Fail if following parents from `id` loops.
pub fn check_ancestry<G: DependencyGraph>(graph: &G, id: ShapeId) -> Result<(), StructureError> {
    let mut cur = graph.parent(id);
    let mut steps = 0_usize;
    while let Some(p) = cur {
        if p == id || steps > graph.len() {
            return Err(StructureError::ParentCycle { shape: id });
        }
        steps += 1;
        cur = if graph.contains(p) { graph.parent(p) } else { None };
    }
    Ok(())
}

/// Reverse post-order over everything reachable from `seeds`.
fn topo_order<G: DependencyGraph>(
    graph: &G,
    seeds: &BTreeSet<ShapeId>,
) -> Result<Vec<ShapeId>, StructureError> {
    let mut state: BTreeMap<ShapeId, Visit> = BTreeMap::new();
    let mut post: Vec<ShapeId> = Vec::new();
    let mut stack: Vec<(ShapeId, Vec<ShapeId>, usize)> = Vec::new();

    let sorted_dependents = |id: ShapeId| {
        let mut out = Vec::new();
        graph.dependents(id, &mut out);
        // Descending here and below so the reversed post-order is ascending.
        out.sort_unstable_by(|a, b| b.cmp(a));
        out.dedup();
        out
    };

    for &seed in seeds.iter().rev() {
        if state.contains_key(&seed) {
            continue;
        }
        state.insert(seed, Visit::InProgress);
        stack.push((seed, sorted_dependents(seed), 0));
        while let Some((id, deps, next)) = stack.last_mut() {
            if let Some(&dep) = deps.get(*next) {
                *next += 1;
                match state.get(&dep) {
                    Some(Visit::InProgress) => {
                        return Err(StructureError::DependencyCycle { shape: dep });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        state.insert(dep, Visit::InProgress);
                        let deps = sorted_dependents(dep);
                        stack.push((dep, deps, 0));
                    }
                }
            } else {
                let id = *id;
                state.insert(id, Visit::Done);
                post.push(id);
                stack.pop();
            }
        }
    }

    post.reverse();
    post.retain(|&id| graph.contains(id));
    Ok(post)
}
