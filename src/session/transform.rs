use crate::{
    config::settings::TwibbonConfig,
    foundation::core::{AnchorBox, NATURAL_SCALE, Rect, Size, TransformState, Vec2},
    geometry::{
        controller::ControllerBox,
        fit::{fit_rect, fit_rect_anchored},
    },
    plan::face_fit::FaceFit,
};

/// Accepted scale range in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    /// Lowest accepted scale.
    pub min: f64,
    /// Highest accepted scale.
    pub max: f64,
}

impl ScaleLimits {
    /// Clamp `scale` into range; NaN maps to `min`.
    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 500.0,
        }
    }
}

impl From<&TwibbonConfig> for ScaleLimits {
    fn from(cfg: &TwibbonConfig) -> Self {
        Self {
            min: cfg.min_scale,
            max: cfg.max_scale,
        }
    }
}

/// Interactive scale/pan editing of one photo in the preview box.
///
/// The session owns the [`TransformState`] and the contain-fit [`AnchorBox`]
/// established at load time. Every placement is re-derived from that anchor,
/// so scale and position edits commute and repeated edits do not drift.
///
/// Placements are in controller pixels; positions are in frame pixels.
#[derive(Clone, Debug)]
pub struct TransformSession {
    controller: ControllerBox,
    limits: ScaleLimits,
    state: TransformState,
    anchor: AnchorBox,
    placement: Option<Rect>,
    dragging: Option<Rect>,
}

impl TransformSession {
    /// Empty session for a preview box.
    pub fn new(controller: ControllerBox, limits: ScaleLimits) -> Self {
        Self {
            controller,
            limits,
            state: TransformState::default(),
            anchor: AnchorBox::INVALID,
            placement: None,
            dragging: None,
        }
    }

    /// Preview box the session places into.
    pub fn controller(&self) -> &ControllerBox {
        &self.controller
    }

    /// Current committed state.
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Contain-fit anchor; invalid until a photo is loaded.
    pub fn anchor(&self) -> AnchorBox {
        self.anchor
    }

    /// Rectangle the preview shows, following an active drag.
    pub fn placement(&self) -> Option<Rect> {
        self.dragging.or(self.placement)
    }

    /// Whether a photo is loaded.
    pub fn is_loaded(&self) -> bool {
        self.anchor.is_valid()
    }

    /// Apply a planned transform.
    ///
    /// Before [`load`](Self::load) this also sets the scale the anchor is
    /// established at. After it, the planned pan is mapped back to the scale of
    /// the existing anchor so the photo lands where the plan intended.
    pub fn seed(&mut self, fit: FaceFit) -> TransformState {
        let scale = self.limits.clamp(fit.scale);
        let ratio = self.anchor.ratio_to(scale);
        let position = if self.anchor.is_valid() && ratio > 0.0 {
            fit.position / ratio
        } else {
            fit.position
        };
        self.state = TransformState { scale, position };
        self.dragging = None;
        self.refresh();
        self.state
    }

    /// Place a photo of `photo_size`.
    ///
    /// The anchor is established only if none is active; loading another photo
    /// requires [`unload`](Self::unload) first. A zero scale anchors at the
    /// natural fit so later rescales have a base to work from.
    pub fn load(&mut self, photo_size: Size) -> Option<Rect> {
        if !self.anchor.is_valid() {
            let scale = if self.state.scale > 0.0 {
                self.state.scale
            } else {
                NATURAL_SCALE
            };
            self.anchor = AnchorBox {
                rect: fit_rect(scale, self.controller.size, photo_size),
                scale,
            };
            tracing::debug!(scale, rect = ?self.anchor.rect, "anchor established");
        }
        self.refresh();
        self.placement
    }

    /// Change the scale, keeping the point under the box center fixed.
    ///
    /// Publishes the position derived from the recomputed placement.
    pub fn set_scale(&mut self, scale: f64) -> TransformState {
        self.state.scale = self.limits.clamp(scale);
        self.dragging = None;
        self.refresh();
        if let Some(position) = self.placement.and_then(|rect| self.position_of(rect)) {
            self.state.position = position;
        }
        self.state
    }

    /// Set the pan offset in frame pixels; the scale is unchanged.
    pub fn set_position(&mut self, position: Vec2) -> Option<Rect> {
        self.state.position = position;
        self.dragging = None;
        self.refresh();
        self.placement
    }

    /// Start a direct-manipulation drag. Returns false when nothing is placed.
    pub fn begin_drag(&mut self) -> bool {
        self.dragging = self.placement;
        self.dragging.is_some()
    }

    /// Move the displayed rectangle by a raw controller-space delta.
    pub fn drag_by(&mut self, delta: Vec2) -> Option<Rect> {
        let rect = self.dragging.as_mut()?;
        *rect = *rect + delta;
        Some(*rect)
    }

    /// Finish a drag and commit the released position.
    ///
    /// Returns the new state, or `None` when there was no drag or the rounded
    /// position did not change.
    pub fn end_drag(&mut self) -> Option<TransformState> {
        let released = self.dragging.take()?;
        let position = self.position_of(released);
        match position {
            Some(position) if position != self.state.position => {
                self.state.position = position;
                self.refresh();
                Some(self.state)
            }
            _ => None,
        }
    }

    /// Drop the photo: invalidate the anchor and reset the state.
    pub fn unload(&mut self) {
        self.anchor = AnchorBox::INVALID;
        self.state = TransformState::default();
        self.placement = None;
        self.dragging = None;
    }

    fn refresh(&mut self) {
        self.placement = self.anchor.is_valid().then(|| self.place(self.state));
    }

    fn place(&self, state: TransformState) -> Rect {
        let pan = self.controller.to_controller(state.position);
        fit_rect_anchored(
            self.anchor.ratio_to(state.scale),
            self.controller.size,
            self.anchor.rect + pan,
        )
    }

    // Inverse of `place` for the position: the rectangle's top-left is first
    // mapped back to the anchor scale, then measured from the anchor origin.
    fn position_of(&self, rect: Rect) -> Option<Vec2> {
        let s = self.anchor.ratio_to(self.state.scale);
        if s <= 0.0 || !self.anchor.is_valid() {
            return None;
        }
        let box_size = self.controller.size;
        let left = (2.0 * rect.x0 + box_size.width * (s - 1.0)) / (2.0 * s);
        let top = (2.0 * rect.y0 + box_size.height * (s - 1.0)) / (2.0 * s);
        let pan = Vec2::new(left - self.anchor.rect.x0, top - self.anchor.rect.y0);
        Some(self.controller.to_frame(pan).round())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/transform.rs"]
mod tests;
