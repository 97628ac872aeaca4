// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page-space bounds of a single shape.
//!
//! Everything here is pure: callers supply the page transform and whatever
//! bounds the shape depends on, already resolved.

use kurbo::{Affine, Point, Rect};
use tessera_index::Aabb2D;

use crate::types::{ShapeKind, ShapeRecord, Terminal};

/// Bounds a shape depends on, resolved by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct Resolved<'a> {
    /// Current page bounds of each child, for aggregating containers.
    pub children: &'a [Rect],
    /// Current page bounds of the start binding's target, if it resolves.
    pub start_target: Option<Rect>,
    /// Current page bounds of the end binding's target, if it resolves.
    pub end_target: Option<Rect>,
}

/// Compute the page-space AABB of a shape.
///
/// - Primitives: conservative box of the transformed local bounds.
/// - Groups: union of `resolved.children`; with no children, a zero-size box
///   at the group's page origin.
/// - Frames: transformed `(0, 0)..size`, independent of children.
/// - Connectors: box spanning both resolved endpoints.
pub fn compute_bounds(record: &ShapeRecord, page_transform: Affine, resolved: &Resolved<'_>) -> Rect {
    match &record.kind {
        ShapeKind::Primitive { local_bounds } => transform_rect_bbox(page_transform, *local_bounds),
        ShapeKind::Group => union_all(resolved.children.iter().copied()).unwrap_or_else(|| {
            let origin = page_transform * Point::ZERO;
            Rect::from_points(origin, origin)
        }),
        ShapeKind::Frame { size } => {
            transform_rect_bbox(page_transform, Rect::from_origin_size(Point::ZERO, *size))
        }
        ShapeKind::Connector { start, end } => {
            let a = resolve_terminal(start, page_transform, resolved.start_target);
            let b = resolve_terminal(end, page_transform, resolved.end_target);
            Rect::from_points(a, b)
        }
    }
}

/// Page-space position of a connector endpoint.
///
/// A bound endpoint lands on its target's anchor; an unbound endpoint, or one
/// whose target did not resolve, uses its own literal point.
pub fn resolve_terminal(terminal: &Terminal, page_transform: Affine, target: Option<Rect>) -> Point {
    match (terminal.binding, target) {
        (Some(binding), Some(bounds)) => anchor_point(bounds, binding.normalized_anchor),
        _ => page_transform * terminal.point,
    }
}

/// Point at fractional position `anchor` within `bounds`.
pub fn anchor_point(bounds: Rect, anchor: Point) -> Point {
    Point::new(
        bounds.x0 + anchor.x * bounds.width(),
        bounds.y0 + anchor.y * bounds.height(),
    )
}

/// Union of all rects, or `None` when there are none.
pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    let mut it = rects.into_iter();
    let first = it.next()?;
    Some(it.fold(first, |acc, r| acc.union(r)))
}

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in page space.
pub fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let p0 = affine * Point::new(rect.x0, rect.y0);
    let p1 = affine * Point::new(rect.x1, rect.y0);
    let p2 = affine * Point::new(rect.x0, rect.y1);
    let p3 = affine * Point::new(rect.x1, rect.y1);
    let min_x = p0.x.min(p1.x).min(p2.x).min(p3.x);
    let min_y = p0.y.min(p1.y).min(p2.y).min(p3.y);
    let max_x = p0.x.max(p1.x).max(p2.x).max(p3.x);
    let max_y = p0.y.max(p1.y).max(p2.y).max(p3.y);
    Rect::new(min_x, min_y, max_x, max_y)
}

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    let r = r.abs();
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}
