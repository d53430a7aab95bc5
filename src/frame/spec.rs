use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    assets::{
        decode::{parse_svg, svg_size},
        source::{is_svg_path, normalize_rel_path},
    },
    foundation::{
        core::Size,
        error::{TwibbonError, TwibbonResult},
    },
};

/// Fixed output canvas and ordered layer slots of one frame ("twibbon").
///
/// Slot numbers are 1-based; slot 1 is the topmost artwork.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpec {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of ordered slots.
    pub layer_count: u32,
    /// Slots reserved for the user photo.
    #[serde(default)]
    pub skip_indices: Vec<u32>,
    /// Artwork source per slot, relative to the manifest root.
    #[serde(default)]
    pub layers: BTreeMap<u32, String>,
    /// Caption template shipped with the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Directory layer sources are resolved against.
    #[serde(skip)]
    pub root: PathBuf,
}

/// One slot of a [`FrameSpec`], in slot order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerSlot {
    /// Fixed artwork drawn at full frame size.
    Artwork {
        /// 1-based slot number.
        slot: u32,
        /// Source path relative to the manifest root.
        source: String,
    },
    /// Slot reserved for the user photo.
    Reserved {
        /// 1-based slot number.
        slot: u32,
    },
}

/// Progress report emitted while discovering a layer directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestProgress {
    /// Layers probed so far.
    pub fetched: usize,
    /// Layers found in the directory.
    pub total: usize,
    /// Human-readable status line.
    pub status: String,
}

impl FrameSpec {
    /// Output size as a [`Size`].
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Check dimensions and slot references.
    pub fn validate(&self) -> TwibbonResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TwibbonError::validation("frame width/height must be > 0"));
        }
        if self.layer_count == 0 {
            return Err(TwibbonError::validation("frame must have at least one layer slot"));
        }
        let in_range = |slot: u32| (1..=self.layer_count).contains(&slot);
        for &slot in &self.skip_indices {
            if !in_range(slot) {
                return Err(TwibbonError::validation(format!(
                    "reserved slot {slot} is outside 1..={}",
                    self.layer_count
                )));
            }
            if self.layers.contains_key(&slot) {
                return Err(TwibbonError::validation(format!(
                    "slot {slot} is both reserved and has artwork"
                )));
            }
        }
        for (&slot, source) in &self.layers {
            if !in_range(slot) {
                return Err(TwibbonError::validation(format!(
                    "layer slot {slot} is outside 1..={}",
                    self.layer_count
                )));
            }
            normalize_rel_path(source)?;
        }
        Ok(())
    }

    /// Slots in order; a slot without artwork counts as reserved.
    pub fn slots(&self) -> Vec<LayerSlot> {
        let reserved: BTreeSet<u32> = self.skip_indices.iter().copied().collect();
        (1..=self.layer_count)
            .map(|slot| match self.layers.get(&slot) {
                Some(source) if !reserved.contains(&slot) => LayerSlot::Artwork {
                    slot,
                    source: source.clone(),
                },
                _ => LayerSlot::Reserved { slot },
            })
            .collect()
    }

    /// Parse a manifest from JSON text; `root` is where layer paths resolve.
    pub fn from_json_str(s: &str, root: impl Into<PathBuf>) -> TwibbonResult<Self> {
        let mut spec: Self =
            serde_json::from_str(s).map_err(|e| TwibbonError::serde(e.to_string()))?;
        spec.root = root.into();
        spec.validate()?;
        Ok(spec)
    }

    /// Load a JSON manifest; layer paths resolve against its directory.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> TwibbonResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read frame manifest '{}'", path.display()))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&text, root)
    }

    /// Build a manifest from a directory of `layerN.<ext>` files.
    ///
    /// The layer key is the file name up to its first `.`. Numbers missing from
    /// `1..=max` become reserved slots. The frame takes its size from the
    /// lowest-numbered layer. `progress` is called once per probed layer.
    #[tracing::instrument(skip(progress))]
    pub fn discover_dir(
        dir: &Path,
        mut progress: impl FnMut(ManifestProgress),
    ) -> TwibbonResult<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("list layer directory '{}'", dir.display()))?;

        let mut layers = BTreeMap::<u32, String>::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(slot) = layer_slot_from_file_name(&name) {
                layers.entry(slot).or_insert(name);
            }
        }

        let total = layers.len();
        let Some(&layer_count) = layers.keys().next_back() else {
            return Err(TwibbonError::validation(format!(
                "no layerN files found in '{}'",
                dir.display()
            )));
        };

        let mut dims = None;
        for (fetched, (slot, name)) in layers.iter().enumerate() {
            if dims.is_none() {
                dims = Some(probe_dimensions(&dir.join(name))?);
            }
            progress(ManifestProgress {
                fetched: fetched + 1,
                total,
                status: format!("found layer {slot}: {name}"),
            });
        }
        let (width, height) = dims.unwrap_or((0, 0));

        let skip_indices = (1..=layer_count)
            .filter(|slot| !layers.contains_key(slot))
            .collect::<Vec<_>>();
        tracing::debug!(width, height, layer_count, ?skip_indices, "frame discovered");

        let spec = Self {
            width,
            height,
            layer_count,
            skip_indices,
            layers,
            caption: None,
            root: dir.to_path_buf(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// `layer12.png` -> 12. Names whose stem is not `layer<digits>` are ignored.
pub(crate) fn layer_slot_from_file_name(name: &str) -> Option<u32> {
    let stem = name.split('.').next()?;
    let digits = stem.strip_prefix("layer")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

fn probe_dimensions(path: &Path) -> TwibbonResult<(u32, u32)> {
    let label = path.display().to_string();
    if is_svg_path(&label) {
        let bytes =
            std::fs::read(path).with_context(|| format!("read svg layer '{label}'"))?;
        let size = svg_size(&parse_svg(&bytes)?);
        return Ok((size.width.ceil() as u32, size.height.ceil() as u32));
    }
    image::image_dimensions(path).map_err(|e| TwibbonError::decode_failed(label, e))
}

#[cfg(test)]
#[path = "../../tests/unit/frame/spec.rs"]
mod tests;
