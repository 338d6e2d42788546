//! Drawing object model: the tagged variants that make up a scene.
//!
//! A [`DrawingObject`] carries the fields every variant shares (id, color,
//! stroke width, opacity, points) plus an [`ObjectKind`] that decides how the
//! points are interpreted:
//!
//! | Kind | Points |
//! |------|--------|
//! | `brush`, `eraser` | every sample along the freehand path |
//! | `line`, `rectangle`, `circle` | exactly two: start and end (the diagonal for boxes) |
//! | `text` | exactly one: the top-left anchor |
//!
//! Points are private so that every mutation goes through a method that drops
//! the cached bounds. `Clone` is a deep copy, which is what drag and resize
//! previews rely on to leave committed history snapshots untouched.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::DEFAULT_TEXT_SIZE;
use crate::geometry::{Bounds, Point, calculate_bounds};
use crate::settings::{DrawingSettings, Tool};

/// Unique identifier for a drawing object.
pub type ObjectId = Uuid;

/// Variant discriminator, serialized as the `tool` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ObjectKind {
    /// Freehand stroke.
    Brush,
    /// Freehand stroke painted in the background color.
    Eraser,
    /// Straight segment.
    Line,
    /// Axis-aligned rectangle outline.
    Rectangle,
    /// Ellipse inscribed in the two-point box.
    Circle,
    /// Single-line label anchored at its top-left corner.
    Text {
        text: String,
        #[serde(rename = "textSize", default = "default_text_size")]
        text_size: f64,
    },
}

fn default_text_size() -> f64 {
    DEFAULT_TEXT_SIZE
}

fn default_opacity() -> f64 {
    1.0
}

impl ObjectKind {
    /// Fewest points a renderable object of this kind needs.
    #[must_use]
    pub fn min_points(&self) -> usize {
        match self {
            Self::Text { .. } => 1,
            _ => 2,
        }
    }

    /// Whether every sampled point is kept (brush, eraser).
    #[must_use]
    pub fn is_freehand(&self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }

    /// Whether only the two defining corners are kept (line, rectangle, circle).
    #[must_use]
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Line | Self::Rectangle | Self::Circle)
    }

    /// Wire name of this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brush => "brush",
            Self::Eraser => "eraser",
            Self::Line => "line",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Text { .. } => "text",
        }
    }

    /// Stroke kind produced by a drawing tool. `None` for tools that do not stroke.
    #[must_use]
    pub fn for_tool(tool: Tool) -> Option<Self> {
        match tool {
            Tool::Brush => Some(Self::Brush),
            Tool::Eraser => Some(Self::Eraser),
            Tool::Line => Some(Self::Line),
            Tool::Rectangle => Some(Self::Rectangle),
            Tool::Circle => Some(Self::Circle),
            Tool::Select | Tool::Text => None,
        }
    }
}

/// A drawable object as stored in the scene and in persisted records.
///
/// Equality compares the stored fields only; the cached bounding box is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingObject {
    id: ObjectId,
    #[serde(flatten)]
    kind: ObjectKind,
    color: String,
    width: f64,
    #[serde(default = "default_opacity")]
    opacity: f64,
    points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
    #[serde(skip)]
    bounds: Option<Bounds>,
}

impl DrawingObject {
    /// Create an object with a fresh id.
    #[must_use]
    pub fn new(kind: ObjectKind, color: impl Into<String>, width: f64, points: Vec<Point>) -> Self {
        Self::with_id(Uuid::new_v4(), kind, color, width, points)
    }

    /// Create an object with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: ObjectId, kind: ObjectKind, color: impl Into<String>, width: f64, points: Vec<Point>) -> Self {
        Self {
            id,
            kind,
            color: color.into(),
            width,
            opacity: 1.0,
            points,
            timestamp: None,
            bounds: None,
        }
    }

    /// Create a text label anchored at `anchor`.
    #[must_use]
    pub fn text(anchor: Point, text: impl Into<String>, text_size: f64, color: impl Into<String>) -> Self {
        Self::new(ObjectKind::Text { text: text.into(), text_size }, color, 1.0, vec![anchor])
    }

    /// Start a stroke at `start` using the active tool, color, width and
    /// opacity. Returns `None` for tools that do not produce strokes.
    #[must_use]
    pub fn from_settings(settings: &DrawingSettings, start: Point) -> Option<Self> {
        let kind = ObjectKind::for_tool(settings.tool)?;
        let mut obj = Self::new(kind, settings.color.clone(), settings.line_width, vec![start]);
        obj.opacity = settings.opacity;
        Some(obj)
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Stroke width in pixels. Kept on text objects for compatibility but not
    /// used for glyph size.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Label of a text object.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Font size of a text object.
    #[must_use]
    pub fn text_size(&self) -> Option<f64> {
        match &self.kind {
            ObjectKind::Text { text_size, .. } => Some(*text_size),
            _ => None,
        }
    }

    /// Creation time in milliseconds since the Unix epoch, if recorded.
    #[must_use]
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    /// Whether the object has the point count its kind requires.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= self.kind.min_points()
    }

    /// Padded bounding box. Uses the cached value when present, otherwise
    /// computes it from the current points.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds.or_else(|| calculate_bounds(self))
    }

    /// Whether a bounds value is currently cached.
    #[must_use]
    pub fn has_cached_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    // --- Mutators ---

    /// Recompute and cache the bounding box.
    pub fn refresh_bounds(&mut self) {
        self.bounds = calculate_bounds(self);
    }

    pub fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_timestamp(&mut self, timestamp: f64) {
        self.timestamp = Some(timestamp);
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width;
        self.bounds = None;
    }

    pub fn set_kind(&mut self, kind: ObjectKind) {
        self.kind = kind;
        self.bounds = None;
    }

    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
        self.bounds = None;
    }

    pub fn push_point(&mut self, point: Point) {
        self.points.push(point);
        self.bounds = None;
    }

    /// Move every point by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            *p = p.offset(dx, dy);
        }
        self.bounds = None;
    }

    /// A copy of this object moved by `(dx, dy)` with fresh bounds.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut out = self.clone();
        out.translate(dx, dy);
        out.refresh_bounds();
        out
    }
}

impl PartialEq for DrawingObject {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.color == other.color
            && self.width == other.width
            && self.opacity == other.opacity
            && self.points == other.points
            && self.timestamp == other.timestamp
    }
}
