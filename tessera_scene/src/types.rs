// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: identities, shape records, and the mutation feed.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Identity of a shape.
///
/// Minted once by the record store and never reused, so it is safe to hold
/// across batches. The total order is used for deterministic tie-breaks in
/// recomputation order and query results.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ShapeId(pub u64);

impl ShapeId {
    /// Wrap a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "shape:{}", self.0)
    }
}

/// Identity of a page.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageId(pub u64);

impl PageId {
    /// Wrap a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl core::fmt::Display for PageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}

/// Non-owning reference from a connector endpoint to another shape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Binding {
    /// The shape the endpoint is anchored to.
    pub target: ShapeId,
    /// Anchor inside the target's page bounds, as fractions of its width and
    /// height. `(0.5, 0.5)` is the center.
    pub normalized_anchor: Point,
}

/// One end of a connector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Terminal {
    /// Literal position in the connector's local space. Used when unbound and
    /// as the fallback when the binding target is gone.
    pub point: Point,
    /// Optional anchor on another shape; overrides `point` while it resolves.
    pub binding: Option<Binding>,
}

impl Terminal {
    /// A free endpoint.
    pub const fn at(point: Point) -> Self {
        Self {
            point,
            binding: None,
        }
    }

    /// An endpoint anchored to `target`, falling back to `point`.
    pub const fn bound(point: Point, target: ShapeId, normalized_anchor: Point) -> Self {
        Self {
            point,
            binding: Some(Binding {
                target,
                normalized_anchor,
            }),
        }
    }
}

/// Geometry of a shape, by type.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Leaf geometry (rectangle, ellipse, text, image, ...) reduced to a
    /// conservative local box.
    Primitive {
        /// Local (untransformed) bounds.
        local_bounds: Rect,
    },
    /// Container whose bounds are the union of its children's bounds.
    Group,
    /// Container with its own box; children never widen it.
    Frame {
        /// Frame size; the frame occupies `(0, 0)..(w, h)` in local space.
        size: Size,
    },
    /// Connector (arrow, line) spanning two endpoints.
    Connector {
        /// Start endpoint.
        start: Terminal,
        /// End endpoint.
        end: Terminal,
    },
}

impl ShapeKind {
    /// Axis-aligned rectangle of the given size at the local origin.
    pub fn rect(w: f64, h: f64) -> Self {
        Self::Primitive {
            local_bounds: Rect::new(0.0, 0.0, w, h),
        }
    }

    /// True for containers whose bounds derive from their children.
    pub fn aggregates_children(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Bindings held by this shape (at most two).
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        let (a, b) = match self {
            Self::Connector { start, end } => (start.binding.as_ref(), end.binding.as_ref()),
            _ => (None, None),
        };
        a.into_iter().chain(b)
    }
}

/// Everything the scene needs to know about one shape.
///
/// Owned by the record store; the scene keeps a copy of the latest committed
/// record to derive relations and recompute bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeRecord {
    /// Page the shape lives on.
    pub page: PageId,
    /// Parent container, or `None` for a page-root shape.
    pub parent: Option<ShapeId>,
    /// Transform relative to the parent (or the page for roots).
    pub transform: Affine,
    /// Geometry.
    pub kind: ShapeKind,
}

impl ShapeRecord {
    /// A page-root shape at the page origin.
    pub fn new(page: PageId, kind: ShapeKind) -> Self {
        Self {
            page,
            parent: None,
            transform: Affine::IDENTITY,
            kind,
        }
    }

    /// Set the parent container.
    pub fn with_parent(mut self, parent: ShapeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the local transform.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Set the local transform to a translation.
    pub fn at(self, x: f64, y: f64) -> Self {
        self.with_transform(Affine::translate(Vec2::new(x, y)))
    }
}

/// One committed change delivered by the record store.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// A new shape.
    Create {
        /// Identity of the new shape.
        id: ShapeId,
        /// Its record.
        record: ShapeRecord,
    },
    /// Replacement record for an existing shape. Covers moves, resizes,
    /// rebinding, reparenting, and page migration.
    Update {
        /// Identity of the shape.
        id: ShapeId,
        /// Its new record.
        record: ShapeRecord,
    },
    /// Parent change with everything else kept.
    Reparent {
        /// Identity of the shape.
        id: ShapeId,
        /// New parent, or `None` to make it a page root.
        parent: Option<ShapeId>,
    },
    /// Removal. Descendants of a deleted container are deleted with it.
    Delete {
        /// Identity of the shape.
        id: ShapeId,
    },
}

impl Mutation {
    /// The shape this mutation targets.
    pub fn id(&self) -> ShapeId {
        match self {
            Self::Create { id, .. }
            | Self::Update { id, .. }
            | Self::Reparent { id, .. }
            | Self::Delete { id } => *id,
        }
    }
}

/// Page lifecycle notification from the page-management collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// A page was added.
    Created(PageId),
    /// A page and all of its shapes were removed.
    Deleted(PageId),
    /// The user switched to this page.
    Activated(PageId),
}

bitflags::bitflags! {
    /// What about a shape changed in a batch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ChangeFlags: u8 {
        /// Intrinsic geometry or bindings changed; only this shape's own box is stale.
        const GEOMETRY  = 0b0000_0001;
        /// Transform or parent changed; every descendant's page transform is stale.
        const PLACEMENT = 0b0000_0010;
        /// Moved to another page.
        const PAGE      = 0b0000_0100;
        /// Deleted.
        const REMOVED   = 0b0000_1000;
    }
}

impl ChangeFlags {
    /// Flags describing the difference between two records of the same shape.
    pub fn between(old: &ShapeRecord, new: &ShapeRecord) -> Self {
        let mut flags = Self::empty();
        if old.kind != new.kind {
            flags |= Self::GEOMETRY;
        }
        if old.transform != new.transform || old.parent != new.parent {
            flags |= Self::PLACEMENT;
        }
        if old.page != new.page {
            flags |= Self::PAGE | Self::PLACEMENT;
        }
        flags
    }
}
