//! Shared numeric constants for the sketchpad crate.

// ── Bounds ──────────────────────────────────────────────────────

/// Margin added on top of the stroke width around every bounding box, so thin
/// strokes and single points stay selectable.
pub const BOUNDS_MARGIN: f64 = 5.0;

/// Approximate glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// Font size assumed for text objects that carry none.
pub const DEFAULT_TEXT_SIZE: f64 = 16.0;

// ── Handles ─────────────────────────────────────────────────────

/// Edge length of a square resize handle in pixels.
pub const HANDLE_SIZE_PX: f64 = 8.0;

/// Smallest width or height a resize gesture may produce.
pub const MIN_RESIZE_PX: f64 = 10.0;

// ── Scaling floors ──────────────────────────────────────────────

/// Smallest readable text size after a rescale.
pub const MIN_TEXT_SIZE: f64 = 8.0;

/// Thinnest stroke after a rescale.
pub const MIN_STROKE_WIDTH: f64 = 1.0;

// ── Selection UI ────────────────────────────────────────────────

/// Dash segment length of the selection outline.
pub const SELECTION_DASH_PX: f64 = 5.0;

/// Stroke color for selection outlines, handles and the marquee.
pub const SELECTION_COLOR: &str = "#1E90FF";

/// Fill for the marquee rectangle.
pub const MARQUEE_FILL: &str = "rgba(30, 144, 255, 0.12)";

/// Outline color for the eraser hover preview.
pub const ERASER_PREVIEW_COLOR: &str = "#FF4136";

// ── Scheduling ──────────────────────────────────────────────────

/// Trailing delay before a burst of viewport resizes is applied.
pub const RESIZE_DEBOUNCE_MS: f64 = 100.0;

/// Repaint offsets after entering or leaving presentation mode.
pub const SETTLE_DELAYS_MS: [f64; 4] = [0.0, 50.0, 150.0, 300.0];
