//! Contain/cover fitting and anchor-relative rescaling.
//!
//! All functions are total: zero-extent boxes or content produce zero-size
//! results instead of NaN or infinities.

use crate::foundation::core::{NATURAL_SCALE, Point, Rect, Size, Vec2};

/// How a fit reports its size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitUnits {
    /// Report the drawn size in pixels.
    Pixels,
    /// Report only the constrained axis as a percentage of the box.
    Percent,
}

/// The axis that touches the box edge, with its percentage of the box extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleAxis {
    /// Width is constrained; value is percent of box width.
    Width(f64),
    /// Height is constrained; value is percent of box height.
    Height(f64),
}

/// Size part of a [`FitResult`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitSize {
    /// Drawn size in pixels.
    Pixels(Size),
    /// Constrained-axis percentage.
    Percent(ScaleAxis),
}

/// Result of a containment computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitResult {
    /// Top-left of the placed content in box space.
    pub position: Point,
    /// Drawn size or constrained-axis percentage.
    pub size: FitSize,
}

impl FitResult {
    /// The placed rectangle, when the fit was computed in [`FitUnits::Pixels`].
    pub fn rect(&self) -> Option<Rect> {
        match self.size {
            FitSize::Pixels(size) => Some(Rect::from_origin_size(self.position, size)),
            FitSize::Percent(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Width,
    Height,
}

// Content that is relatively wider than the box reaches the box width first.
fn contain_axis(bx: Size, content: Size) -> Axis {
    if content.width * bx.height > bx.width * content.height {
        Axis::Width
    } else {
        Axis::Height
    }
}

fn has_area(s: Size) -> bool {
    s.width > 0.0 && s.height > 0.0 && s.width.is_finite() && s.height.is_finite()
}

fn contain_factor(bx: Size, content: Size) -> f64 {
    if !has_area(content) {
        return 0.0;
    }
    match contain_axis(bx, content) {
        Axis::Width => bx.width / content.width,
        Axis::Height => bx.height / content.height,
    }
}

fn cover_factor(bx: Size, content: Size) -> f64 {
    if !has_area(content) {
        return 0.0;
    }
    (bx.width / content.width).max(bx.height / content.height)
}

fn centered(bx: Size, drawn: Size) -> Point {
    Point::new(
        (bx.width - drawn.width) / 2.0,
        (bx.height - drawn.height) / 2.0,
    )
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale.max(0.0) } else { 0.0 }
}

fn percent_of(axis: Axis, bx: Size, drawn: Size) -> ScaleAxis {
    fn pct(part: f64, whole: f64) -> f64 {
        if whole > 0.0 {
            part / whole * NATURAL_SCALE
        } else {
            0.0
        }
    }
    match axis {
        Axis::Width => ScaleAxis::Width(pct(drawn.width, bx.width)),
        Axis::Height => ScaleAxis::Height(pct(drawn.height, bx.height)),
    }
}

/// Contain-fit `content` in `bx` at `scale` percent of the natural fit, centered.
///
/// At 100 the content touches the box on its constrained axis: width when the
/// content is relatively wider than the box, height otherwise.
pub fn fit_box(scale: f64, units: FitUnits, bx: Size, content: Size) -> FitResult {
    let scale = sanitize_scale(scale);
    let k = contain_factor(bx, content) * scale / NATURAL_SCALE;
    let drawn = Size::new(content.width * k, content.height * k);
    let position = centered(bx, drawn);

    let size = match units {
        FitUnits::Pixels => FitSize::Pixels(drawn),
        FitUnits::Percent => match contain_axis(bx, content) {
            Axis::Width => FitSize::Percent(ScaleAxis::Width(scale)),
            Axis::Height => FitSize::Percent(ScaleAxis::Height(scale)),
        },
    };
    FitResult { position, size }
}

/// Pixel rectangle of [`fit_box`].
pub fn fit_rect(scale: f64, bx: Size, content: Size) -> Rect {
    let scale = sanitize_scale(scale);
    let k = contain_factor(bx, content) * scale / NATURAL_SCALE;
    let drawn = Size::new(content.width * k, content.height * k);
    Rect::from_origin_size(centered(bx, drawn), drawn)
}

/// Cover-fit `content` over `bx` at `scale` percent, centered; overflow is allowed.
pub fn cover_rect(scale: f64, bx: Size, content: Size) -> Rect {
    let scale = sanitize_scale(scale);
    let k = cover_factor(bx, content) * scale / NATURAL_SCALE;
    let drawn = Size::new(content.width * k, content.height * k);
    Rect::from_origin_size(centered(bx, drawn), drawn)
}

/// Rescale a placed rectangle by `scale_ratio` around the box center.
///
/// The point of `current` that sits under the box center stays there; every edge
/// moves proportionally to its distance from that center. A pan baked into
/// `current` is therefore carried over to the new scale.
pub fn fit_box_anchored(scale_ratio: f64, units: FitUnits, bx: Size, current: Rect) -> FitResult {
    let rect = fit_rect_anchored(scale_ratio, bx, current);
    let size = match units {
        FitUnits::Pixels => FitSize::Pixels(rect.size()),
        FitUnits::Percent => {
            FitSize::Percent(percent_of(contain_axis(bx, current.size()), bx, rect.size()))
        }
    };
    FitResult {
        position: rect.origin(),
        size,
    }
}

/// Pixel rectangle of [`fit_box_anchored`].
pub fn fit_rect_anchored(scale_ratio: f64, bx: Size, current: Rect) -> Rect {
    let r = sanitize_scale(scale_ratio);
    let anchor = Point::new(bx.width / 2.0, bx.height / 2.0);
    let origin = anchor + (current.origin() - anchor) * r;
    Rect::from_origin_size(origin, current.size() * r)
}

/// Offset that moves `rect` so its center lands on the center of `bx`.
pub fn center_offset(bx: Size, rect: Rect) -> Vec2 {
    Point::new(bx.width / 2.0, bx.height / 2.0) - rect.center()
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
