//! Canvas placement and sizing.
//!
//! The scene is not panned or zoomed: one scene unit is one CSS pixel, with
//! the origin at the canvas's top-left corner. The viewport only tracks where
//! the canvas sits on the page (to convert client coordinates) and how large
//! it should be.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::geometry::Point;

/// Share of the window height the canvas may occupy.
const MAX_HEIGHT_RATIO: f64 = 0.6;

/// Height-to-width ratio used when the window is tall enough.
const ASPECT_RATIO: f64 = 0.75;

/// Canvas position and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Client-space x of the canvas's left edge.
    pub origin_x: f64,
    /// Client-space y of the canvas's top edge.
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
    /// Device pixel ratio of the backing store.
    pub dpr: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { origin_x: 0.0, origin_y: 0.0, width: 0.0, height: 0.0, dpr: 1.0 }
    }
}

impl Viewport {
    /// Convert a client-space point (e.g. `MouseEvent.clientX/Y`) to scene
    /// coordinates.
    #[must_use]
    pub fn client_to_scene(&self, client: Point) -> Point {
        Point::new(client.x - self.origin_x, client.y - self.origin_y)
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin_x = x;
        self.origin_y = y;
    }

    /// Canvas size for a container of `container_width` inside a window of
    /// `window_height`: full width, and height capped at 60% of the window
    /// or three quarters of the width, whichever is smaller.
    #[must_use]
    pub fn fit(container_width: f64, window_height: f64) -> (f64, f64) {
        let width = container_width.max(0.0);
        let height = (window_height * MAX_HEIGHT_RATIO).min(width * ASPECT_RATIO).max(0.0);
        (width, height)
    }

    /// Apply [`Viewport::fit`] and return the new size.
    pub fn resize_to_fit(&mut self, container_width: f64, window_height: f64) -> (f64, f64) {
        let (width, height) = Self::fit(container_width, window_height);
        self.width = width;
        self.height = height;
        (width, height)
    }

    /// Backing-store size in device pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn backing_size(&self) -> (u32, u32) {
        ((self.width * self.dpr).round() as u32, (self.height * self.dpr).round() as u32)
    }
}
