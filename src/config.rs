//! Engine configuration supplied by the host page.
//!
//! Every field has a default, so a host can pass `{}` or only the keys it
//! wants to override:
//!
//! - `handle_size`: resize handle edge length in pixels (8)
//! - `min_resize`: smallest width/height a resize can produce (10)
//! - `min_text_size`: floor for rescaled text (8)
//! - `min_stroke_width`: floor for rescaled strokes (1)
//! - `history_limit`: maximum undo depth, `0` for unbounded (0)
//! - `resize_debounce_ms`: trailing delay for viewport resizes (100)
//! - `settle_delays_ms`: repaint offsets after a view-mode change (`[0, 50, 150, 300]`)
//! - `default_settings`: tool settings at startup
//! - `storage_prefix`: key prefix for the key-value store (`drawing_app`)

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    HANDLE_SIZE_PX, MIN_RESIZE_PX, MIN_STROKE_WIDTH, MIN_TEXT_SIZE, RESIZE_DEBOUNCE_MS, SETTLE_DELAYS_MS,
};
use crate::geometry::ScaleLimits;
use crate::settings::DrawingSettings;

pub const DEFAULT_STORAGE_PREFIX: &str = "drawing_app";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub handle_size: f64,
    pub min_resize: f64,
    pub min_text_size: f64,
    pub min_stroke_width: f64,
    pub history_limit: usize,
    pub resize_debounce_ms: f64,
    pub settle_delays_ms: Vec<f64>,
    pub default_settings: DrawingSettings,
    pub storage_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handle_size: HANDLE_SIZE_PX,
            min_resize: MIN_RESIZE_PX,
            min_text_size: MIN_TEXT_SIZE,
            min_stroke_width: MIN_STROKE_WIDTH,
            history_limit: 0,
            resize_debounce_ms: RESIZE_DEBOUNCE_MS,
            settle_delays_ms: SETTLE_DELAYS_MS.to_vec(),
            default_settings: DrawingSettings::default(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate host JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-finite and non-positive sizes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("handle_size", self.handle_size)?;
        positive("min_resize", self.min_resize)?;
        positive("min_text_size", self.min_text_size)?;
        positive("min_stroke_width", self.min_stroke_width)?;
        non_negative("resize_debounce_ms", self.resize_debounce_ms)?;
        for delay in &self.settle_delays_ms {
            non_negative("settle_delays_ms", *delay)?;
        }

        let settings = &self.default_settings;
        positive("default_settings.line_width", settings.line_width)?;
        positive("default_settings.text_size", settings.text_size)?;
        if !(0.0..=1.0).contains(&settings.opacity) {
            return Err(invalid("default_settings.opacity", format!("{} is outside 0..=1", settings.opacity)));
        }

        if self.storage_prefix.trim().is_empty() {
            return Err(invalid("storage_prefix", "must not be empty".into()));
        }
        Ok(())
    }

    /// Floors used when rescaling objects.
    #[must_use]
    pub fn scale_limits(&self) -> ScaleLimits {
        ScaleLimits { min_text_size: self.min_text_size, min_stroke_width: self.min_stroke_width }
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be a positive number")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be zero or greater")))
    }
}
