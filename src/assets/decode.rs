use std::sync::Arc;

use anyhow::Context;

use crate::foundation::{
    core::Size,
    error::{TwibbonError, TwibbonResult},
    math::premultiply_rgba8_in_place,
};

/// Decoded raster in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Pixel dimensions as a [`Size`].
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Wrap a straight-alpha RGBA image.
    pub fn from_rgba(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }
}

/// Decode PNG/JPEG/... bytes into a premultiplied image.
pub fn decode_image(bytes: &[u8]) -> TwibbonResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(PreparedImage::from_rgba(dyn_img.to_rgba8()))
}

/// Parse an SVG document.
pub fn parse_svg(bytes: &[u8]) -> TwibbonResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Intrinsic size of a parsed SVG.
pub fn svg_size(tree: &usvg::Tree) -> Size {
    let s = tree.size();
    Size::new(f64::from(s.width()), f64::from(s.height()))
}

/// Rasterize an SVG stretched to exactly `width` x `height` pixels.
///
/// `resvg` renders premultiplied RGBA8, which is what the compositor consumes.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> TwibbonResult<PreparedImage> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TwibbonError::validation("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
