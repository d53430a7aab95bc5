//! Auto-zoom around a detected face.
//!
//! The planner works in analysis-bitmap pixels and answers in the units the
//! transform session stores: a scale percent and a frame-space pan offset.

use crate::{
    config::settings::TwibbonConfig,
    foundation::core::{NATURAL_SCALE, Point, Rect, Size, Vec2},
    geometry::{controller::ControllerBox, fit::fit_rect, padding::pad_rect},
};

/// Initial transform proposed for a photo with a detected face.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FaceFit {
    /// Whole-percent scale of the natural contain fit.
    pub scale: f64,
    /// Pan offset in frame pixels, rounded to whole pixels.
    pub position: Vec2,
}

/// Plan a scale and pan that make the first face fill the preview vertically.
///
/// `faces` are in the coordinate space of the analysis bitmap of
/// `analysis_size`. A zoom whose view would reach past the photo on either axis
/// falls back to the natural fit. Returns `None` when there is no face, the
/// bitmap is empty, or the rounded scale would exceed `cfg.max_scale`.
pub fn plan_face_fit(
    faces: &[Rect],
    analysis_size: Size,
    controller: &ControllerBox,
    cfg: &TwibbonConfig,
) -> Option<FaceFit> {
    let face = faces.first()?;
    if analysis_size.width <= 0.0 || analysis_size.height <= 0.0 {
        return None;
    }

    let bounds = Rect::from_origin_size(Point::ORIGIN, analysis_size);
    let padded = pad_rect(face.abs(), cfg.face_padding, bounds);

    // Analysis pixels -> controller pixels at the natural fit.
    let natural = fit_rect(NATURAL_SCALE, controller.size, analysis_size);
    let k = natural.width() / analysis_size.width;

    // Below `min_zoom` the zoomed view is wider or taller than the photo.
    let min_zoom = (controller.size.width / natural.width())
        .max(controller.size.height / natural.height());
    let mut zoom = controller.size.height / (padded.height() * k);
    if !zoom.is_finite() || zoom < min_zoom * (1.0 - 1e-9) {
        tracing::debug!(zoom, min_zoom, "zoomed view exceeds the photo, keeping natural fit");
        zoom = 1.0;
    }

    let scale = (NATURAL_SCALE * zoom).round();
    if scale > cfg.max_scale {
        tracing::debug!(scale, max = cfg.max_scale, "planned scale rejected");
        return None;
    }

    let image_center = Point::new(analysis_size.width / 2.0, analysis_size.height / 2.0);
    let pan = (image_center - padded.center()) * (zoom * k);
    let position = controller.to_frame(pan).round();

    tracing::debug!(scale, x = position.x, y = position.y, "face fit planned");
    Some(FaceFit { scale, position })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/face_fit.rs"]
mod tests;
