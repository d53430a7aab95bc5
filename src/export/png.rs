use std::{io::Cursor, path::Path};

use anyhow::Context as _;

use crate::foundation::{
    core::FrameRGBA,
    error::{TwibbonError, TwibbonResult},
    math::unpremultiply_rgba8_in_place,
};

/// PNG bytes of `frame`, converted to straight alpha.
pub fn encode_png(frame: &FrameRGBA) -> TwibbonResult<Vec<u8>> {
    let expected = (frame.width as usize) * (frame.height as usize) * 4;
    if frame.data.len() != expected {
        return Err(TwibbonError::validation(format!(
            "frame buffer has {} bytes, expected {expected} for {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| TwibbonError::validation("frame buffer does not match its size"))?;

    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Encode `frame` and write it to `path`, creating parent directories.
#[tracing::instrument(skip(frame), fields(width = frame.width, height = frame.height))]
pub fn write_png(path: &Path, frame: &FrameRGBA) -> TwibbonResult<()> {
    let bytes = encode_png(frame)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/png.rs"]
mod tests;
