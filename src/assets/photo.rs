use std::{path::Path, sync::Arc};

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::{
    assets::decode::{PreparedImage, decode_image},
    config::settings::TwibbonConfig,
    foundation::{
        core::PhotoId,
        error::{TwibbonError, TwibbonResult},
        math::unpremultiply_rgba8_in_place,
    },
};

/// A user photo accepted by intake.
#[derive(Clone, Debug)]
pub struct Photo {
    /// Identity of this load; a re-load of the same file gets a new id.
    pub id: PhotoId,
    /// Full-resolution pixels used for export.
    pub image: Arc<PreparedImage>,
}

impl Photo {
    /// Wrap decoded pixels under a fresh id.
    pub fn new(image: PreparedImage) -> Self {
        Self {
            id: PhotoId::next(),
            image: Arc::new(image),
        }
    }
}

/// Check extension and file size before any decoding happens.
pub fn validate_photo_file(path: &Path, cfg: &TwibbonConfig) -> TwibbonResult<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| TwibbonError::validation("photo file has no extension"))?;
    if !cfg.photo_extensions.iter().any(|allowed| *allowed == ext) {
        return Err(TwibbonError::validation(format!(
            "photo format '.{ext}' is not supported"
        )));
    }

    let len = std::fs::metadata(path)
        .with_context(|| format!("stat photo '{}'", path.display()))?
        .len();
    if len > cfg.max_photo_bytes {
        return Err(TwibbonError::validation(format!(
            "photo is too large: {len} bytes (max {})",
            cfg.max_photo_bytes
        )));
    }
    Ok(())
}

/// Validate, read and decode a photo file.
#[tracing::instrument(skip(cfg))]
pub fn load_photo(path: &Path, cfg: &TwibbonConfig) -> TwibbonResult<Photo> {
    validate_photo_file(path, cfg)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("read photo '{}'", path.display()))?;
    let image =
        decode_image(&bytes).map_err(|e| TwibbonError::decode_failed("photo", e))?;
    tracing::debug!(width = image.width, height = image.height, "photo decoded");
    Ok(Photo::new(image))
}

/// Straight-alpha copy of the photo bounded to `max_edge` on its long side.
///
/// Photos already within the bound are copied at full size; they are never upscaled.
pub fn analysis_bitmap(photo: &Photo, max_edge: u32) -> image::RgbaImage {
    let src = &photo.image;
    let mut data = src.rgba8_premul.as_ref().clone();
    unpremultiply_rgba8_in_place(&mut data);
    let full = image::RgbaImage::from_raw(src.width, src.height, data)
        .unwrap_or_else(|| image::RgbaImage::new(src.width, src.height));

    let long = src.width.max(src.height);
    if long <= max_edge || long == 0 {
        return full;
    }
    let k = f64::from(max_edge) / f64::from(long);
    let w = ((f64::from(src.width) * k).round() as u32).max(1);
    let h = ((f64::from(src.height) * k).round() as u32).max(1);
    image::imageops::resize(&full, w, h, FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/photo.rs"]
mod tests;
