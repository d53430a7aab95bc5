use crate::{
    assets::{photo::Photo, source::LayerSource},
    foundation::core::{Point, Rect},
    frame::spec::{FrameSpec, LayerSlot},
};

/// One ordered compositing unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// 1-based slot; an appended photo takes `layer_count + 1`.
    pub slot: u32,
    /// Pixel source.
    pub source: LayerSource,
    /// Whether this is the user photo, drawn at a cover-fit rectangle.
    pub cover: bool,
    /// Draw rectangle in frame pixels. Artwork fills the frame; the cover
    /// layer's rectangle is resolved at render time from the transform state.
    pub draw_rect: Rect,
}

/// Layers of `frame` in slot order, with `photo` in the first reserved slot.
///
/// Without a reserved slot the photo is appended after the last slot, which
/// puts it at the bottom of the stack. Other reserved slots stay empty.
pub fn build_layers(frame: &FrameSpec, photo: Option<&Photo>) -> Vec<Layer> {
    let full = Rect::from_origin_size(Point::ORIGIN, frame.size());
    let mut photo = photo.map(|p| LayerSource::Image(p.image.clone()));
    let mut layers = Vec::with_capacity(frame.layer_count as usize + 1);

    for slot in frame.slots() {
        match slot {
            LayerSlot::Artwork { slot, source } => layers.push(Layer {
                slot,
                source: LayerSource::File(source),
                cover: false,
                draw_rect: full,
            }),
            LayerSlot::Reserved { slot } => {
                if let Some(source) = photo.take() {
                    layers.push(Layer {
                        slot,
                        source,
                        cover: true,
                        draw_rect: full,
                    });
                }
            }
        }
    }

    if let Some(source) = photo {
        layers.push(Layer {
            slot: frame.layer_count + 1,
            source,
            cover: true,
            draw_rect: full,
        });
    }
    layers
}

#[cfg(test)]
#[path = "../../tests/unit/composite/layers.rs"]
mod tests;
