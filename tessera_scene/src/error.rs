// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for batch application.
//!
//! Dangling parents and binding targets are not errors; they resolve to
//! fallback geometry and are only logged.

use tessera_index::IndexError;
use thiserror::Error;

use crate::types::ShapeId;

/// Integrity violation in the parent or binding graph.
///
/// Fatal to the batch that introduced it: the scene rolls the batch back and
/// leaves every index untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    /// Following parents from `shape` never reaches a page root.
    #[error("parent cycle through {shape}")]
    ParentCycle {
        /// A shape on or below the cycle.
        shape: ShapeId,
    },

    /// Bounds of `shape` would depend on themselves, e.g. a connector bound
    /// to a group that contains it.
    #[error("bounds dependency cycle through {shape}")]
    DependencyCycle {
        /// A shape on the cycle.
        shape: ShapeId,
    },

    /// A shape's parent lives on another page.
    #[error("{shape} and its parent {parent} are on different pages")]
    CrossPageParent {
        /// The child.
        shape: ShapeId,
        /// Its parent.
        parent: ShapeId,
    },
}

/// Reasons [`Scene::apply`](crate::Scene::apply) can reject a batch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The batch would corrupt the parent or binding graph.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// `Create` for an identity that is already live.
    #[error("{shape} already exists")]
    DuplicateShape {
        /// The offending identity.
        shape: ShapeId,
    },

    /// `Update` or `Reparent` for an identity that is not live.
    #[error("{shape} does not exist")]
    UnknownShape {
        /// The offending identity.
        shape: ShapeId,
    },

    /// The scene's bounds cache and a page index disagree.
    #[error("page index out of sync for {shape}: {source}")]
    Index {
        /// The shape being written.
        shape: ShapeId,
        /// What the index reported.
        source: IndexError,
    },
}
