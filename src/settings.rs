//! Tool configuration: the active tool and the style applied to new objects.
//!
//! Changing settings never touches objects already in the scene.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_TEXT_SIZE;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select, move, resize and group existing objects.
    Select,
    /// Freehand stroke (default).
    #[default]
    Brush,
    /// Delete whole objects under the pointer.
    Eraser,
    /// Straight segment.
    Line,
    /// Rectangle outline.
    Rectangle,
    /// Ellipse outline.
    Circle,
    /// Place a text label.
    Text,
}

impl Tool {
    /// Whether strokes from this tool keep every pointer sample.
    #[must_use]
    pub fn is_freehand(self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }

    /// Whether this tool draws a two-point shape.
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Line | Self::Rectangle | Self::Circle)
    }

    /// CSS cursor for the canvas while this tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Text => "text",
            Self::Eraser => "not-allowed",
            Self::Brush | Self::Line | Self::Rectangle | Self::Circle => "crosshair",
        }
    }
}

/// The style applied to newly created objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingSettings {
    pub tool: Tool,
    /// Stroke/fill color as a CSS color string.
    pub color: String,
    /// Stroke width in pixels.
    pub line_width: f64,
    /// Font size for new text objects.
    #[serde(default = "default_text_size")]
    pub text_size: f64,
    /// 0 (transparent) to 1 (opaque).
    pub opacity: f64,
    /// Canvas background; also the paint color of eraser strokes.
    pub background_color: String,
}

fn default_text_size() -> f64 {
    DEFAULT_TEXT_SIZE
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            color: "#000000".into(),
            line_width: 3.0,
            text_size: DEFAULT_TEXT_SIZE,
            opacity: 1.0,
            background_color: "#FFFFFF".into(),
        }
    }
}

/// Sparse settings update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl SettingsPatch {
    /// Patch that only switches the tool.
    #[must_use]
    pub fn tool(tool: Tool) -> Self {
        Self { tool: Some(tool), ..Default::default() }
    }
}

impl DrawingSettings {
    /// Merge `patch` into these settings. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: &SettingsPatch) -> bool {
        let before = self.clone();
        if let Some(tool) = patch.tool {
            self.tool = tool;
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
        if let Some(w) = patch.line_width {
            self.line_width = w;
        }
        if let Some(s) = patch.text_size {
            self.text_size = s;
        }
        if let Some(o) = patch.opacity {
            self.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(ref bg) = patch.background_color {
            self.background_color.clone_from(bg);
        }
        *self != before
    }
}
