use std::sync::atomic::{AtomicU64, Ordering};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Percent scale at which content exactly touches the box on its constrained axis.
pub const NATURAL_SCALE: f64 = 100.0;

/// Live scale/pan state of the user photo.
///
/// `scale` is a percentage of the natural fit (100 = natural). `position` is the pan
/// offset in frame pixel space; positive x/y move right/down.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformState {
    /// Percent of the natural fit.
    pub scale: f64,
    /// Pan offset in frame pixels.
    pub position: Vec2,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: NATURAL_SCALE,
            position: Vec2::ZERO,
        }
    }
}

/// Snapshot of a fitted box at the scale it was computed at.
///
/// Every rescale re-derives from this snapshot instead of from the previous
/// placement, so repeated edits do not accumulate drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorBox {
    /// Placed rectangle at `scale`.
    pub rect: Rect,
    /// Scale (percent) the rectangle was computed at; negative means "not established".
    pub scale: f64,
}

impl AnchorBox {
    /// An anchor that has not been established yet.
    pub const INVALID: Self = Self {
        rect: Rect::ZERO,
        scale: -1.0,
    };

    /// Whether the anchor holds a fit.
    pub fn is_valid(&self) -> bool {
        self.scale >= 0.0
    }

    /// Ratio that maps the anchor's scale to `scale`.
    ///
    /// A zero-scale anchor cannot be rescaled; it yields a ratio of zero.
    pub fn ratio_to(&self, scale: f64) -> f64 {
        if self.scale > 0.0 {
            scale / self.scale
        } else {
            0.0
        }
    }
}

impl Default for AnchorBox {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Identity of one loaded user photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhotoId(u64);

impl PhotoId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A rendered frame of RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
            premultiplied: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
