use crate::foundation::core::{Size, Vec2};

/// The on-screen preview box ("controller space").
///
/// It shares the frame's aspect ratio; `ratio` converts controller pixels to
/// frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerBox {
    /// Preview box size in controller pixels.
    pub size: Size,
    /// Frame pixels per controller pixel.
    pub ratio: f64,
}

impl ControllerBox {
    /// Controller box of `width` for a frame of `frame_width` x `frame_height`.
    ///
    /// A zero-sized frame or width collapses to a zero box with a ratio of 1.
    pub fn for_frame(width: f64, frame_width: u32, frame_height: u32) -> Self {
        let fw = f64::from(frame_width);
        let fh = f64::from(frame_height);
        if width <= 0.0 || fw <= 0.0 || !width.is_finite() {
            return Self {
                size: Size::ZERO,
                ratio: 1.0,
            };
        }
        Self {
            size: Size::new(width, width * fh / fw),
            ratio: fw / width,
        }
    }

    /// Controller-space offset expressed in frame pixels.
    pub fn to_frame(&self, v: Vec2) -> Vec2 {
        v * self.ratio
    }

    /// Frame-space offset expressed in controller pixels.
    pub fn to_controller(&self, v: Vec2) -> Vec2 {
        if self.ratio > 0.0 { v / self.ratio } else { Vec2::ZERO }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/controller.rs"]
mod tests;
