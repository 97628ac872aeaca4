// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::grid::{GridConfig, GridF64};
use crate::damage::Damage;
use crate::error::IndexError;
use crate::types::Aabb2D;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mark {
    Added,
    Updated,
    Removed,
}

#[derive(Clone, Debug)]
struct Entry<T, K> {
    key: K,
    // Latest staged box; equals `committed` when no write is pending.
    aabb: Aabb2D<T>,
    committed: Option<Aabb2D<T>>,
    mark: Option<Mark>,
}

/// An exact AABB index keyed by caller identity, parameterized by a spatial backend.
///
/// Writes are staged: [`insert`](Self::insert), [`update`](Self::update) and
/// [`remove`](Self::remove) record intent, and [`commit`](Self::commit) applies every
/// staged write to the backend in one step. Queries only ever observe committed
/// state, so a reader never sees half of a batch.
#[derive(Debug)]
pub struct IndexGeneric<T: Copy + PartialOrd + Debug, K: Ord + Copy + Debug, B: Backend<T>> {
    entries: Vec<Option<Entry<T, K>>>,
    free_list: Vec<usize>,
    slots: BTreeMap<K, usize>,
    pending: Vec<usize>,
    committed_len: usize,
    backend: B,
}

impl<T, K, B> IndexGeneric<T, K, B>
where
    T: Copy + PartialOrd + Debug,
    K: Ord + Copy + Debug,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<T, K, B> IndexGeneric<T, K, B>
where
    T: Copy + PartialOrd + Debug,
    K: Ord + Copy + Debug,
    B: Backend<T>,
{
    /// Create an empty index over an explicitly configured backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            slots: BTreeMap::new(),
            pending: Vec::new(),
            committed_len: 0,
            backend,
        }
    }

    /// Stage a new entry.
    ///
    /// Fails with [`IndexError::DuplicateKey`] if `key` is live; use
    /// [`update`](Self::update) instead. A key whose removal is staged may be
    /// inserted again in the same batch.
    pub fn insert(&mut self, key: K, aabb: Aabb2D<T>) -> Result<(), IndexError> {
        if let Some(&slot) = self.slots.get(&key) {
            let e = self.entry_mut(slot);
            if e.mark != Some(Mark::Removed) {
                return Err(IndexError::DuplicateKey);
            }
            e.aabb = aabb;
            e.mark = Some(Mark::Updated);
            return Ok(());
        }
        let entry = Entry {
            key,
            aabb,
            committed: None,
            mark: Some(Mark::Added),
        };
        let slot = if let Some(slot) = self.free_list.pop() {
            self.entries[slot] = Some(entry);
            slot
        } else {
            self.entries.push(Some(entry));
            self.entries.len() - 1
        };
        self.slots.insert(key, slot);
        self.pending.push(slot);
        Ok(())
    }

    /// Stage new bounds for a live entry.
    ///
    /// Fails with [`IndexError::UnknownKey`] if `key` is absent or its removal is
    /// staged. Writing the bounds it already has is a no-op.
    pub fn update(&mut self, key: K, aabb: Aabb2D<T>) -> Result<(), IndexError> {
        let slot = *self.slots.get(&key).ok_or(IndexError::UnknownKey)?;
        let e = self.entry_mut(slot);
        match e.mark {
            Some(Mark::Removed) => return Err(IndexError::UnknownKey),
            _ if e.aabb == aabb => return Ok(()),
            Some(Mark::Added) | Some(Mark::Updated) => {}
            None => {
                e.mark = Some(Mark::Updated);
                self.pending.push(slot);
            }
        }
        self.entry_mut(slot).aabb = aabb;
        Ok(())
    }

    /// Stage removal of an entry. Returns whether anything was live under `key`.
    ///
    /// Removing an absent key is a no-op, so removal is idempotent.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(&slot) = self.slots.get(&key) else {
            return false;
        };
        let e = self.entry_mut(slot);
        match e.mark {
            Some(Mark::Removed) => false,
            Some(Mark::Added) => {
                // Never reached the backend; drop it outright.
                self.entries[slot] = None;
                self.slots.remove(&key);
                self.free_list.push(slot);
                true
            }
            Some(Mark::Updated) => {
                if e.committed.is_none() {
                    self.entries[slot] = None;
                    self.slots.remove(&key);
                    self.free_list.push(slot);
                } else {
                    e.mark = Some(Mark::Removed);
                }
                true
            }
            None => {
                e.mark = Some(Mark::Removed);
                self.pending.push(slot);
                true
            }
        }
    }

    /// Clear the index immediately (without reporting damage).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free_list.clear();
        self.slots.clear();
        self.pending.clear();
        self.committed_len = 0;
        self.backend.clear();
    }

    /// True if any write is staged and not yet committed.
    pub fn has_pending(&self) -> bool {
        self.pending
            .iter()
            .any(|&i| matches!(&self.entries[i], Some(e) if e.mark.is_some()))
    }

    /// Apply staged changes to the backend and compute batched damage.
    pub fn commit(&mut self) -> Damage<T> {
        let mut dmg = Damage::default();
        for i in core::mem::take(&mut self.pending) {
            let Some(entry) = self.entries[i].as_mut() else {
                continue;
            };
            match entry.mark.take() {
                Some(Mark::Added) => {
                    self.backend.insert(i, entry.aabb);
                    entry.committed = Some(entry.aabb);
                    self.committed_len += 1;
                    dmg.added.push(entry.aabb);
                }
                Some(Mark::Updated) => {
                    match entry.committed {
                        Some(prev) if prev != entry.aabb => {
                            self.backend.update(i, entry.aabb);
                            dmg.moved.push((prev, entry.aabb));
                        }
                        Some(_) => {}
                        None => {
                            self.backend.insert(i, entry.aabb);
                            self.committed_len += 1;
                            dmg.added.push(entry.aabb);
                        }
                    }
                    entry.committed = Some(entry.aabb);
                }
                Some(Mark::Removed) => {
                    self.backend.remove(i);
                    if let Some(prev) = entry.committed {
                        dmg.removed.push(prev);
                        self.committed_len -= 1;
                    }
                    let key = entry.key;
                    self.entries[i] = None;
                    self.slots.remove(&key);
                    self.free_list.push(i);
                }
                None => {}
            }
        }
        dmg
    }

    /// Committed bounds for `key`, if any.
    pub fn get(&self, key: K) -> Option<Aabb2D<T>> {
        let slot = *self.slots.get(&key)?;
        self.entries[slot].as_ref()?.committed
    }

    /// True if `key` is live from the writer's point of view (an `insert` would fail).
    pub fn contains(&self, key: K) -> bool {
        self.slots
            .get(&key)
            .and_then(|&slot| self.entries[slot].as_ref())
            .is_some_and(|e| e.mark != Some(Mark::Removed))
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.committed_len
    }

    /// True if no entries are committed.
    pub fn is_empty(&self) -> bool {
        self.committed_len == 0
    }

    /// Keys with committed bounds, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.iter().filter_map(|(&k, &slot)| {
            self.entries[slot]
                .as_ref()
                .and_then(|e| e.committed)
                .map(|_| k)
        })
    }

    /// Backend access, for diagnostics.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Entries whose committed AABB contains the point, in ascending key order.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (K, Aabb2D<T>)> + '_ {
        self.collect_sorted(self.backend.query_point(x, y))
    }

    /// Entries whose committed AABB intersects or touches the rectangle, in ascending key order.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (K, Aabb2D<T>)> + '_ {
        self.collect_sorted(self.backend.query_rect(rect))
    }

    fn collect_sorted(
        &self,
        slots: impl Iterator<Item = usize>,
    ) -> alloc::vec::IntoIter<(K, Aabb2D<T>)> {
        let mut out: Vec<(K, Aabb2D<T>)> = slots
            .filter_map(|i| {
                let e = self.entries.get(i)?.as_ref()?;
                Some((e.key, e.committed?))
            })
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        out.dedup_by(|a, b| a.0 == b.0);
        out.into_iter()
    }

    fn entry_mut(&mut self, slot: usize) -> &mut Entry<T, K> {
        self.entries[slot]
            .as_mut()
            .expect("slot map points at a live entry")
    }
}

/// Default index using a flat vector backend.
pub type Index<T, K> = IndexGeneric<T, K, FlatVec<T>>;

/// Grid-backed `f64` index; the usual choice for canvas pages.
pub type GridIndex<K> = IndexGeneric<f64, K, GridF64>;

impl<T: Copy + PartialOrd + Debug, K: Ord + Copy + Debug> Default for Index<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy + Debug> GridIndex<K> {
    /// Create a grid-backed index with the given configuration.
    pub fn with_grid(config: GridConfig) -> Self {
        Self::with_backend(GridF64::new(config))
    }
}
