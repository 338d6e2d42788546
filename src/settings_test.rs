#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

#[test]
fn defaults_match_startup_settings() {
    let s = DrawingSettings::default();
    assert_eq!(s.tool, Tool::Brush);
    assert_eq!(s.color, "#000000");
    assert_eq!(s.line_width, 3.0);
    assert_eq!(s.text_size, 16.0);
    assert_eq!(s.opacity, 1.0);
    assert_eq!(s.background_color, "#FFFFFF");
}

#[test]
fn tool_families() {
    assert!(Tool::Brush.is_freehand());
    assert!(!Tool::Line.is_freehand());
    assert!(Tool::Rectangle.is_shape());
    assert!(!Tool::Text.is_shape());
    assert!(!Tool::Select.is_shape());
}

#[test]
fn tool_cursors() {
    assert_eq!(Tool::Select.cursor(), "default");
    assert_eq!(Tool::Brush.cursor(), "crosshair");
    assert_eq!(Tool::Text.cursor(), "text");
    assert_eq!(Tool::Eraser.cursor(), "not-allowed");
}

// =============================================================
// apply
// =============================================================

#[test]
fn apply_merges_present_fields_only() {
    let mut s = DrawingSettings::default();
    let changed = s.apply(&SettingsPatch { color: Some("#FF0000".into()), line_width: Some(9.0), ..Default::default() });
    assert!(changed);
    assert_eq!(s.color, "#FF0000");
    assert_eq!(s.line_width, 9.0);
    assert_eq!(s.tool, Tool::Brush);
    assert_eq!(s.background_color, "#FFFFFF");
}

#[test]
fn apply_reports_no_change_for_same_values() {
    let mut s = DrawingSettings::default();
    assert!(!s.apply(&SettingsPatch::tool(Tool::Brush)));
    assert!(!s.apply(&SettingsPatch::default()));
}

#[test]
fn apply_clamps_opacity() {
    let mut s = DrawingSettings::default();
    s.apply(&SettingsPatch { opacity: Some(1.5), ..Default::default() });
    assert_eq!(s.opacity, 1.0);
    s.apply(&SettingsPatch { opacity: Some(-0.5), ..Default::default() });
    assert_eq!(s.opacity, 0.0);
}

// =============================================================
// Serialization
// =============================================================

#[test]
fn serializes_camel_case() {
    let value = serde_json::to_value(DrawingSettings::default()).unwrap();
    assert_eq!(value["tool"], "brush");
    assert_eq!(value["lineWidth"], 3.0);
    assert_eq!(value["textSize"], 16.0);
    assert_eq!(value["backgroundColor"], "#FFFFFF");
}

#[test]
fn deserializes_legacy_settings() {
    let value = json!({
        "backgroundColor": "#FFFFFF",
        "tool": "eraser",
        "color": "#000000",
        "lineWidth": 3,
        "opacity": 1,
        "isDrawingEnabled": true
    });
    let s: DrawingSettings = serde_json::from_value(value).unwrap();
    assert_eq!(s.tool, Tool::Eraser);
    assert_eq!(s.text_size, 16.0);
}

#[test]
fn patch_skips_absent_fields() {
    let value = serde_json::to_value(SettingsPatch::tool(Tool::Circle)).unwrap();
    assert_eq!(value, json!({ "tool": "circle" }));
}
