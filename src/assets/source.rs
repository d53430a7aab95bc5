use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    assets::decode::{PreparedImage, decode_image, parse_svg, rasterize_svg},
    foundation::{
        core::Size,
        error::{TwibbonError, TwibbonResult},
    },
};

/// Where a layer's pixels come from.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerSource {
    /// Artwork file, relative to the manifest root.
    File(String),
    /// Already decoded pixels (the user photo).
    Image(Arc<PreparedImage>),
}

impl LayerSource {
    /// Short label used in logs and errors.
    pub fn label(&self) -> String {
        match self {
            Self::File(p) => p.clone(),
            Self::Image(img) => format!("image {}x{}", img.width, img.height),
        }
    }
}

/// Turns a [`LayerSource`] into drawable pixels.
///
/// Implementations are shared across the compositor's decode workers.
pub trait LayerDecoder: Send + Sync {
    /// Decode `source`. Vector sources rasterize at `target` size.
    fn decode(&self, source: &LayerSource, target: Size) -> TwibbonResult<Arc<PreparedImage>>;
}

/// Filesystem decoder rooted at a manifest directory.
///
/// Decoded artwork is cached by path and raster size; frames are reused across
/// many recomposites while only the photo transform changes.
#[derive(Debug, Default)]
pub struct FsLayerDecoder {
    root: PathBuf,
    cache: Mutex<HashMap<(String, u32, u32), Arc<PreparedImage>>>,
}

impl FsLayerDecoder {
    /// Decoder resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Manifest root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_file(&self, rel: &str, target: Size) -> TwibbonResult<Arc<PreparedImage>> {
        let norm = normalize_rel_path(rel)?;
        let (tw, th) = raster_dims(target);
        let key = (norm.clone(), tw, th);
        if let Some(hit) = self.cache.lock().ok().and_then(|c| c.get(&key).cloned()) {
            return Ok(hit);
        }

        let path = self.root.join(&norm);
        let bytes = std::fs::read(&path).map_err(|e| TwibbonError::decode_failed(&norm, e))?;
        let prepared = if is_svg_path(&norm) {
            let tree = parse_svg(&bytes).map_err(|e| TwibbonError::decode_failed(&norm, e))?;
            rasterize_svg(&tree, tw, th).map_err(|e| TwibbonError::decode_failed(&norm, e))?
        } else {
            decode_image(&bytes).map_err(|e| TwibbonError::decode_failed(&norm, e))?
        };

        let prepared = Arc::new(prepared);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&prepared));
        }
        Ok(prepared)
    }
}

impl LayerDecoder for FsLayerDecoder {
    fn decode(&self, source: &LayerSource, target: Size) -> TwibbonResult<Arc<PreparedImage>> {
        match source {
            LayerSource::Image(img) => Ok(Arc::clone(img)),
            LayerSource::File(rel) => self.load_file(rel, target),
        }
    }
}

pub(crate) fn is_svg_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

fn raster_dims(target: Size) -> (u32, u32) {
    let w = target.width.round().clamp(1.0, f64::from(u32::MAX)) as u32;
    let h = target.height.round().clamp(1.0, f64::from(u32::MAX)) as u32;
    (w, h)
}

/// Normalize a relative asset path to a stable `/`-separated form.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// `..` traversal.
pub fn normalize_rel_path(source: &str) -> TwibbonResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(TwibbonError::validation("layer paths must be relative"));
    }
    if s.is_empty() {
        return Err(TwibbonError::validation("layer path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(TwibbonError::validation("layer paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(TwibbonError::validation("layer path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
