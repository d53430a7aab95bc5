//! Symmetric padding of a rectangle inside an enclosing area.

use crate::foundation::core::{Rect, Size};

/// Largest symmetric padding multiplier `rect` accepts without leaving `bounds`.
///
/// Per axis the slack is the smaller gap between `rect` and `bounds`; the axis
/// allows `1 + 2 * slack / extent`. The result is the most restrictive axis. A
/// zero-extent axis places no limit (infinity).
pub fn estimate_max_padding(rect: Rect, bounds: Rect) -> f64 {
    fn axis_limit(lo: f64, hi: f64, bound_lo: f64, bound_hi: f64) -> f64 {
        let extent = hi - lo;
        if extent <= 0.0 {
            return f64::INFINITY;
        }
        let slack = (lo - bound_lo).min(bound_hi - hi);
        1.0 + 2.0 * slack / extent
    }

    let x = axis_limit(rect.x0, rect.x1, bounds.x0, bounds.x1);
    let y = axis_limit(rect.y0, rect.y1, bounds.y0, bounds.y1);
    x.min(y)
}

/// Grow `rect` about its own center by `desired_padding`, capped so it stays in `bounds`.
///
/// The applied multiplier is `min(desired, estimate_max_padding)`, floored at 0.
pub fn pad_rect(rect: Rect, desired_padding: f64, bounds: Rect) -> Rect {
    let m = desired_padding
        .min(estimate_max_padding(rect, bounds))
        .max(0.0);
    let m = if m.is_finite() { m } else { 0.0 };
    let size = Size::new(rect.width() * m, rect.height() * m);
    Rect::from_center_size(rect.center(), size)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/padding.rs"]
mod tests;
