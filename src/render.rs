//! Rendering: paints the scene and selection UI onto a 2D surface.
//!
//! Drawing goes through the [`Surface`] trait, which mirrors the handful of
//! `CanvasRenderingContext2d` calls the projector needs. The browser
//! implementation forwards to `web_sys`; tests use a recording surface. The
//! projector reads a [`RenderView`] and mutates nothing.
//!
//! Layers, bottom to top: background, objects in paint order, selection
//! outlines with corner handles, eraser hover outline, marquee.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::BTreeSet;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{ERASER_PREVIEW_COLOR, MARQUEE_FILL, SELECTION_COLOR, SELECTION_DASH_PX};
use crate::geometry::{Bounds, Point};
use crate::hit::Handle;
use crate::object::{DrawingObject, ObjectId, ObjectKind};

/// Primitive 2D paint operations.
pub trait Surface {
    type Error;

    /// # Errors
    ///
    /// Surface-specific failure.
    fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), Self::Error>;
    fn save(&self);
    fn restore(&self);
    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn set_fill_color(&self, color: &str);
    fn set_stroke_color(&self, color: &str);
    fn set_line_width(&self, width: f64);
    fn set_global_alpha(&self, alpha: f64);
    fn set_line_cap(&self, cap: &str);
    fn set_line_join(&self, join: &str);
    /// # Errors
    ///
    /// Surface-specific failure.
    fn set_line_dash(&self, segments: &[f64]) -> Result<(), Self::Error>;
    fn set_font(&self, font: &str);
    fn set_text_baseline(&self, baseline: &str);
    fn begin_path(&self);
    fn move_to(&self, x: f64, y: f64);
    fn line_to(&self, x: f64, y: f64);
    fn stroke(&self);
    /// Add a full axis-aligned ellipse to the current path.
    ///
    /// # Errors
    ///
    /// Surface-specific failure (e.g. negative radius).
    fn ellipse(&self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<(), Self::Error>;
    /// # Errors
    ///
    /// Surface-specific failure.
    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), Self::Error>;
}

impl Surface for CanvasRenderingContext2d {
    type Error = JsValue;

    fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::set_transform(self, a, b, c, d, e, f)
    }

    fn save(&self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
    }

    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::stroke_rect(self, x, y, w, h);
    }

    fn set_fill_color(&self, color: &str) {
        self.set_fill_style_str(color);
    }

    fn set_stroke_color(&self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_global_alpha(&self, alpha: f64) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha);
    }

    fn set_line_cap(&self, cap: &str) {
        CanvasRenderingContext2d::set_line_cap(self, cap);
    }

    fn set_line_join(&self, join: &str) {
        CanvasRenderingContext2d::set_line_join(self, join);
    }

    fn set_line_dash(&self, segments: &[f64]) -> Result<(), JsValue> {
        let dash_array = js_sys::Array::new();
        for s in segments {
            dash_array.push(&(*s).into());
        }
        CanvasRenderingContext2d::set_line_dash(self, &dash_array)
    }

    fn set_font(&self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn set_text_baseline(&self, baseline: &str) {
        CanvasRenderingContext2d::set_text_baseline(self, baseline);
    }

    fn begin_path(&self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn stroke(&self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn ellipse(&self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::ellipse(self, cx, cy, rx, ry, 0.0, 0.0, 2.0 * PI)
    }

    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::fill_text(self, text, x, y)
    }
}

/// Everything the projector needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderView<'a> {
    /// Objects in paint order, with gesture previews and the in-progress
    /// stroke already merged in.
    pub objects: Vec<&'a DrawingObject>,
    pub selection: &'a BTreeSet<ObjectId>,
    pub marquee: Option<Bounds>,
    pub eraser_hover: Option<ObjectId>,
    pub background: &'a str,
    pub handle_size: f64,
    /// Viewport size in CSS pixels.
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

/// Draw a full frame.
///
/// # Errors
///
/// Returns the surface's error if any fallible call fails.
pub fn draw<S: Surface>(surface: &S, view: &RenderView<'_>) -> Result<(), S::Error> {
    // Layer 1: background.
    surface.set_transform(view.dpr, 0.0, 0.0, view.dpr, 0.0, 0.0)?;
    surface.clear_rect(0.0, 0.0, view.width, view.height);
    surface.set_fill_color(view.background);
    surface.fill_rect(0.0, 0.0, view.width, view.height);

    // Layer 2: objects, bottom first.
    for obj in &view.objects {
        draw_object(surface, obj, view.background)?;
    }

    // Layer 3: selection UI.
    for obj in view.objects.iter().filter(|o| view.selection.contains(&o.id())) {
        if let Some(bounds) = obj.bounds() {
            draw_selection(surface, &bounds, view.handle_size)?;
        }
    }

    if let Some(id) = view.eraser_hover {
        if let Some(bounds) = view.objects.iter().find(|o| o.id() == id).and_then(|o| o.bounds()) {
            draw_eraser_hover(surface, &bounds)?;
        }
    }

    if let Some(m) = view.marquee {
        draw_marquee(surface, &m)?;
    }

    Ok(())
}

// =============================================================
// Object dispatch
// =============================================================

/// Paint one object. Eraser strokes are painted in `background`.
///
/// # Errors
///
/// Returns the surface's error if any fallible call fails.
pub fn draw_object<S: Surface>(surface: &S, obj: &DrawingObject, background: &str) -> Result<(), S::Error> {
    if !obj.is_renderable() {
        return Ok(());
    }
    surface.save();
    surface.set_global_alpha(obj.opacity());

    match obj.kind() {
        ObjectKind::Brush => draw_path(surface, obj.points(), obj.color(), obj.width()),
        ObjectKind::Eraser => draw_path(surface, obj.points(), background, obj.width()),
        ObjectKind::Line => draw_path(surface, &obj.points()[..2], obj.color(), obj.width()),
        ObjectKind::Rectangle => draw_rect(surface, obj),
        ObjectKind::Circle => draw_ellipse(surface, obj)?,
        ObjectKind::Text { text, text_size } => draw_text(surface, obj, text, *text_size)?,
    }

    surface.restore();
    Ok(())
}

fn draw_path<S: Surface>(surface: &S, points: &[Point], color: &str, width: f64) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    surface.set_stroke_color(color);
    surface.set_line_width(width);
    surface.set_line_cap("round");
    surface.set_line_join("round");
    surface.begin_path();
    surface.move_to(first.x, first.y);
    for p in rest {
        surface.line_to(p.x, p.y);
    }
    surface.stroke();
}

fn draw_rect<S: Surface>(surface: &S, obj: &DrawingObject) {
    let b = Bounds::from_corners(obj.points()[0], obj.points()[1]);
    surface.set_stroke_color(obj.color());
    surface.set_line_width(obj.width());
    surface.stroke_rect(b.x, b.y, b.width, b.height);
}

fn draw_ellipse<S: Surface>(surface: &S, obj: &DrawingObject) -> Result<(), S::Error> {
    let b = Bounds::from_corners(obj.points()[0], obj.points()[1]);
    let c = b.center();
    surface.set_stroke_color(obj.color());
    surface.set_line_width(obj.width());
    surface.begin_path();
    surface.ellipse(c.x, c.y, b.width / 2.0, b.height / 2.0)?;
    surface.stroke();
    Ok(())
}

fn draw_text<S: Surface>(surface: &S, obj: &DrawingObject, text: &str, text_size: f64) -> Result<(), S::Error> {
    let anchor = obj.points()[0];
    surface.set_fill_color(obj.color());
    surface.set_font(&format!("{text_size}px sans-serif"));
    surface.set_text_baseline("top");
    surface.fill_text(text, anchor.x, anchor.y)
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection<S: Surface>(surface: &S, bounds: &Bounds, handle_size: f64) -> Result<(), S::Error> {
    surface.save();
    surface.set_stroke_color(SELECTION_COLOR);
    surface.set_line_width(1.0);
    surface.set_line_dash(&[SELECTION_DASH_PX, SELECTION_DASH_PX])?;
    surface.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    surface.set_line_dash(&[])?;

    let half = handle_size / 2.0;
    surface.set_fill_color("#fff");
    for handle in Handle::ALL {
        let c = bounds.corner(handle);
        surface.fill_rect(c.x - half, c.y - half, handle_size, handle_size);
        surface.stroke_rect(c.x - half, c.y - half, handle_size, handle_size);
    }
    surface.restore();
    Ok(())
}

fn draw_eraser_hover<S: Surface>(surface: &S, bounds: &Bounds) -> Result<(), S::Error> {
    surface.save();
    surface.set_stroke_color(ERASER_PREVIEW_COLOR);
    surface.set_line_width(1.0);
    surface.set_line_dash(&[SELECTION_DASH_PX, SELECTION_DASH_PX])?;
    surface.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    surface.set_line_dash(&[])?;
    surface.restore();
    Ok(())
}

fn draw_marquee<S: Surface>(surface: &S, marquee: &Bounds) -> Result<(), S::Error> {
    surface.save();
    surface.set_line_dash(&[SELECTION_DASH_PX, SELECTION_DASH_PX])?;
    surface.set_stroke_color(SELECTION_COLOR);
    surface.set_fill_color(MARQUEE_FILL);
    surface.set_line_width(1.0);
    surface.fill_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    surface.stroke_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    surface.set_line_dash(&[])?;
    surface.restore();
    Ok(())
}
