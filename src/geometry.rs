//! Geometry: points, padded bounding boxes, and the pure functions that
//! compute, compare and rescale them.
//!
//! Every bounding box produced here is a *selection* box, not a tight
//! geometric bound. It is padded by the stroke width plus a fixed margin so
//! that hairline strokes and single-point objects remain easy to hit. Text
//! extents are estimated from the character count because real glyph metrics
//! are only available from the drawing surface.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::{BOUNDS_MARGIN, GLYPH_WIDTH_RATIO, MIN_STROKE_WIDTH, MIN_TEXT_SIZE};
use crate::hit::Handle;
use crate::object::{DrawingObject, ObjectKind};

/// A point in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Axis-aligned rectangle. `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Build a rectangle, clamping negative extents to zero.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width: width.max(0.0), height: height.max(0.0) }
    }

    /// The rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Position of the given corner handle.
    #[must_use]
    pub fn corner(&self, handle: Handle) -> Point {
        match handle {
            Handle::TopLeft => Point::new(self.x, self.y),
            Handle::TopRight => Point::new(self.right(), self.y),
            Handle::BottomLeft => Point::new(self.x, self.bottom()),
            Handle::BottomRight => Point::new(self.right(), self.bottom()),
        }
    }

    /// Shrink by `d` on every side. An axis that would collapse below zero
    /// collapses onto its center line instead.
    #[must_use]
    pub fn inset(&self, d: f64) -> Self {
        let (x, width) = inset_axis(self.x, self.width, d);
        let (y, height) = inset_axis(self.y, self.height, d);
        Self { x, y, width, height }
    }

    /// Grow by `d` on every side.
    #[must_use]
    pub fn expand(&self, d: f64) -> Self {
        Self::new(self.x - d, self.y - d, self.width + d * 2.0, self.height + d * 2.0)
    }
}

fn inset_axis(start: f64, len: f64, d: f64) -> (f64, f64) {
    let inner = len - d * 2.0;
    if inner >= 0.0 {
        (start + d, inner)
    } else {
        (start + len / 2.0, 0.0)
    }
}

/// Floors applied when an object is rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    pub min_text_size: f64,
    pub min_stroke_width: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min_text_size: MIN_TEXT_SIZE, min_stroke_width: MIN_STROKE_WIDTH }
    }
}

// =============================================================
// Bounds computation
// =============================================================

/// Padding applied around an object drawn with `stroke_width`.
#[must_use]
pub fn padding_for(stroke_width: f64) -> f64 {
    stroke_width + BOUNDS_MARGIN
}

/// Approximate rendered width of `text` at `font_size`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn approximate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * GLYPH_WIDTH_RATIO
}

/// Padded bounding box of an object, or `None` when it has no points.
///
/// The box covers every point and is expanded by `width + 5` on each side.
/// Text objects are additionally extended right and down from the anchor by
/// the approximate extent of the label.
#[must_use]
pub fn calculate_bounds(obj: &DrawingObject) -> Option<Bounds> {
    let points = obj.points();
    let first = points.first()?;

    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    if let ObjectKind::Text { text, text_size } = obj.kind() {
        if !text.is_empty() {
            max_x = max_x.max(first.x + approximate_text_width(text, *text_size));
            max_y = max_y.max(first.y + text_size);
        }
    }

    let pad = padding_for(obj.width());
    Some(Bounds::new(
        min_x - pad,
        min_y - pad,
        max_x - min_x + pad * 2.0,
        max_y - min_y + pad * 2.0,
    ))
}

/// Inclusive containment on all four edges.
#[must_use]
pub fn is_point_in_bounds(point: Point, bounds: &Bounds) -> bool {
    point.x >= bounds.x && point.x <= bounds.right() && point.y >= bounds.y && point.y <= bounds.bottom()
}

/// Axis-aligned overlap test. Touching edges count as overlapping.
#[must_use]
pub fn rects_overlap(a: &Bounds, b: &Bounds) -> bool {
    !(a.right() < b.x || b.right() < a.x || a.bottom() < b.y || b.bottom() < a.y)
}

// =============================================================
// Resize
// =============================================================

/// New bounds for a resize gesture dragging `handle` by `(dx, dy)` from
/// `initial`. The opposite corner stays fixed and neither side shrinks below
/// `min_size`.
#[must_use]
pub fn resize_bounds(initial: &Bounds, handle: Handle, dx: f64, dy: f64, min_size: f64) -> Bounds {
    let (moves_left, moves_top) = match handle {
        Handle::TopLeft => (true, true),
        Handle::TopRight => (false, true),
        Handle::BottomLeft => (true, false),
        Handle::BottomRight => (false, false),
    };

    let (x, width) = resize_axis(initial.x, initial.width, dx, moves_left, min_size);
    let (y, height) = resize_axis(initial.y, initial.height, dy, moves_top, min_size);
    Bounds { x, y, width, height }
}

fn resize_axis(start: f64, len: f64, delta: f64, moves_start: bool, min_size: f64) -> (f64, f64) {
    if moves_start {
        let end = start + len;
        let len = (len - delta).max(min_size);
        (end - len, len)
    } else {
        (start, (len + delta).max(min_size))
    }
}

// =============================================================
// Scaling
// =============================================================

/// Rescale `obj` so its padded bounds become `new_bounds`, using the default
/// floors.
#[must_use]
pub fn scale_object(obj: &DrawingObject, new_bounds: &Bounds) -> DrawingObject {
    scale_object_with(obj, new_bounds, ScaleLimits::default())
}

/// Rescale `obj` so its padded bounds become `new_bounds`.
///
/// Geometry is re-projected from the inner (unpadded) box of the current
/// bounds into the inner box of `new_bounds`, so recomputing the bounds of
/// the result yields `new_bounds` again. Scaling to the object's own bounds
/// leaves it unchanged.
#[must_use]
pub fn scale_object_with(obj: &DrawingObject, new_bounds: &Bounds, limits: ScaleLimits) -> DrawingObject {
    let Some(old) = obj.bounds() else {
        return obj.clone();
    };

    // Zero-sized source boxes fall back to a unit box.
    let old_w = if old.width > 0.0 { old.width } else { 1.0 };
    let old_h = if old.height > 0.0 { old.height } else { 1.0 };
    let avg_scale = (new_bounds.width / old_w + new_bounds.height / old_h) / 2.0;

    let mut out = obj.clone();
    match obj.kind() {
        ObjectKind::Text { text, text_size } => {
            let pad = padding_for(obj.width());
            let size = (text_size * avg_scale).max(limits.min_text_size);
            out.set_kind(ObjectKind::Text { text: text.clone(), text_size: size });
            out.set_points(vec![Point::new(new_bounds.x + pad, new_bounds.y + pad)]);
        }
        kind => {
            let width = (obj.width() * avg_scale).max(limits.min_stroke_width);
            let from = old.inset(padding_for(obj.width()));
            let to = new_bounds.inset(padding_for(width));
            let points = match kind {
                ObjectKind::Rectangle | ObjectKind::Circle => snap_to_corners(obj.points(), &to),
                _ => obj.points().iter().map(|p| reproject(*p, &from, &to)).collect(),
            };
            out.set_width(width);
            out.set_points(points);
        }
    }
    out
}

/// Map `p` from its relative position inside `from` to the same relative
/// position inside `to`. A collapsed source axis maps to the target's center.
fn reproject(p: Point, from: &Bounds, to: &Bounds) -> Point {
    let x = if from.width > 0.0 {
        to.x + (p.x - from.x) / from.width * to.width
    } else {
        to.x + to.width / 2.0
    };
    let y = if from.height > 0.0 {
        to.y + (p.y - from.y) / from.height * to.height
    } else {
        to.y + to.height / 2.0
    };
    Point::new(x, y)
}

/// Re-derive the two defining corners of a rectangle or ellipse from `to`,
/// keeping each point on the side of the box it already occupied.
fn snap_to_corners(points: &[Point], to: &Bounds) -> Vec<Point> {
    let [a, b] = points else {
        return points.to_vec();
    };
    let a_left = a.x <= b.x;
    let a_top = a.y <= b.y;
    let pick = |left: bool, top: bool| {
        Point::new(if left { to.x } else { to.right() }, if top { to.y } else { to.bottom() })
    };
    vec![pick(a_left, a_top), pick(!a_left, !a_top)]
}
