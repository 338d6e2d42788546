//! Hit-testing: resize handles, topmost-object lookup, and marquee overlap.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::geometry::{Bounds, Point, is_point_in_bounds, rects_overlap};
use crate::object::{DrawingObject, ObjectId};

/// Corner handle of a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    /// Handles in hit-test priority order.
    pub const ALL: [Handle; 4] = [Handle::TopLeft, Handle::TopRight, Handle::BottomLeft, Handle::BottomRight];

    /// CSS cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::TopLeft | Handle::BottomRight => "nwse-resize",
            Handle::TopRight | Handle::BottomLeft => "nesw-resize",
        }
    }
}

/// The corner handle within half a handle's width of `point`, if any.
///
/// Corners are checked in [`Handle::ALL`] order and the first match wins,
/// even when a later corner is closer.
#[must_use]
pub fn resize_handle_at(point: Point, bounds: &Bounds, handle_size: f64) -> Option<Handle> {
    let half = handle_size / 2.0;
    Handle::ALL.into_iter().find(|h| {
        let c = bounds.corner(*h);
        (point.x - c.x).abs() <= half && (point.y - c.y).abs() <= half
    })
}

/// The topmost object whose bounds contain `point`.
///
/// Objects later in the slice are painted on top, so the scan runs back to
/// front.
#[must_use]
pub fn find_object_at_point<'a, I>(objects: I, point: Point) -> Option<&'a DrawingObject>
where
    I: IntoIterator<Item = &'a DrawingObject>,
    I::IntoIter: DoubleEndedIterator,
{
    objects
        .into_iter()
        .rev()
        .find(|obj| obj.bounds().is_some_and(|b| is_point_in_bounds(point, &b)))
}

/// Ids of every object whose bounds overlap `rect`, in paint order.
#[must_use]
pub fn objects_in_rect<'a, I>(objects: I, rect: &Bounds) -> Vec<ObjectId>
where
    I: IntoIterator<Item = &'a DrawingObject>,
{
    objects
        .into_iter()
        .filter(|obj| obj.bounds().is_some_and(|b| rects_overlap(rect, &b)))
        .map(DrawingObject::id)
        .collect()
}
