// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lock-guarded scene handle for multi-threaded hosts.

use alloc::vec::Vec;
use std::sync::Arc;

use kurbo::Rect;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::SceneError;
use crate::propagate::BatchReport;
use crate::scene::{Scene, SceneConfig};
use crate::types::{Mutation, PageEvent, PageId, ShapeId};

/// Cloneable handle to a [`Scene`] behind a read-write lock.
///
/// A batch holds the write lock for its whole propagation pass, so readers on
/// other threads observe either the state before the batch or after it.
#[derive(Clone, Debug, Default)]
pub struct SharedScene {
    inner: Arc<RwLock<Scene>>,
}

impl SharedScene {
    /// Wrap an existing scene.
    pub fn new(scene: Scene) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scene)),
        }
    }

    /// An empty scene with the given configuration.
    pub fn with_config(config: SceneConfig) -> Self {
        Self::new(Scene::with_config(config))
    }

    /// See [`Scene::apply`].
    pub fn apply(&self, batch: &[Mutation]) -> Result<BatchReport, SceneError> {
        self.inner.write().apply(batch)
    }

    /// See [`Scene::handle_page_event`].
    pub fn handle_page_event(&self, event: PageEvent) {
        self.inner.write().handle_page_event(event);
    }

    /// See [`Scene::query`].
    pub fn query(&self, page: PageId, rect: Rect) -> Vec<ShapeId> {
        self.inner.read().query(page, rect)
    }

    /// See [`Scene::query_active`].
    pub fn query_active(&self, rect: Rect) -> Vec<ShapeId> {
        self.inner.read().query_active(rect)
    }

    /// See [`Scene::bounds`].
    pub fn bounds(&self, id: ShapeId) -> Option<Rect> {
        self.inner.read().bounds(id)
    }

    /// Hold a read lock for several consistent reads.
    pub fn read(&self) -> RwLockReadGuard<'_, Scene> {
        self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ShapeKind, ShapeRecord};

    #[test]
    fn readers_on_other_threads_see_whole_batches() {
        let shared = SharedScene::default();
        let page = PageId(1);
        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..50_u64 {
                let x = i as f64 * 10.0;
                writer
                    .apply(&[
                        Mutation::Create {
                            id: ShapeId(2 * i),
                            record: ShapeRecord::new(page, ShapeKind::rect(5.0, 5.0)).at(x, 0.0),
                        },
                        Mutation::Create {
                            id: ShapeId(2 * i + 1),
                            record: ShapeRecord::new(page, ShapeKind::rect(5.0, 5.0)).at(x, 0.0),
                        },
                    ])
                    .unwrap();
            }
        });
        for _ in 0..50 {
            let hits = shared.query(page, Rect::new(-1e9, -1e9, 1e9, 1e9));
            assert_eq!(hits.len() % 2, 0, "batches are never half applied");
        }
        handle.join().unwrap();
        assert_eq!(shared.read().len(), 100);
        assert_eq!(shared.bounds(ShapeId(99)), Some(Rect::new(490.0, 0.0, 495.0, 5.0)));
    }
}
