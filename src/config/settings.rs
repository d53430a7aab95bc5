use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{TwibbonError, TwibbonResult},
    session::transform::ScaleLimits,
};

/// Tunables shared by the planner, the session and file intake.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TwibbonConfig {
    /// Preview box width in controller pixels; its height follows the frame aspect.
    pub controller_width: f64,
    /// Multiplier applied to a detected face box to include context around it.
    pub face_padding: f64,
    /// Lowest accepted scale percent.
    pub min_scale: f64,
    /// Highest accepted scale percent; face fits above it are discarded.
    pub max_scale: f64,
    /// Long edge of the bitmap handed to the face detector.
    pub analysis_max_edge: u32,
    /// Largest accepted photo file in bytes.
    pub max_photo_bytes: u64,
    /// Accepted photo file extensions, lowercase without the dot.
    pub photo_extensions: Vec<String>,
    /// Compositor worker threads; `None` uses one per core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_threads: Option<usize>,
}

impl Default for TwibbonConfig {
    fn default() -> Self {
        Self {
            controller_width: 250.0,
            face_padding: 3.5,
            min_scale: 0.0,
            max_scale: 500.0,
            analysis_max_edge: 600,
            max_photo_bytes: 10 * 1024 * 1024,
            photo_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            render_threads: None,
        }
    }
}

impl TwibbonConfig {
    /// Parse a config from JSON text.
    pub fn from_json_str(s: &str) -> TwibbonResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| TwibbonError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a config from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> TwibbonResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Reject settings the geometry cannot work with.
    pub fn validate(&self) -> TwibbonResult<()> {
        if !(self.controller_width.is_finite() && self.controller_width > 0.0) {
            return Err(TwibbonError::validation("controller_width must be > 0"));
        }
        if !(self.face_padding.is_finite() && self.face_padding >= 0.0) {
            return Err(TwibbonError::validation("face_padding must be >= 0"));
        }
        if !(self.min_scale.is_finite() && self.max_scale.is_finite()) {
            return Err(TwibbonError::validation("scale limits must be finite"));
        }
        if self.min_scale < 0.0 || self.min_scale > self.max_scale {
            return Err(TwibbonError::validation(
                "scale limits must satisfy 0 <= min_scale <= max_scale",
            ));
        }
        if self.analysis_max_edge == 0 {
            return Err(TwibbonError::validation("analysis_max_edge must be > 0"));
        }
        if self.render_threads == Some(0) {
            return Err(TwibbonError::validation("render_threads must be >= 1 when set"));
        }
        Ok(())
    }

    /// Clamp a scale percent into the configured range.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        ScaleLimits::from(self).clamp(scale)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
