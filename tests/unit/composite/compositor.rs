use std::collections::HashMap;

use super::*;
use crate::{
    assets::source::LayerSource,
    foundation::core::{Rect, Size, Vec2},
};

struct MapDecoder(HashMap<String, Arc<PreparedImage>>);

impl LayerDecoder for MapDecoder {
    fn decode(&self, source: &LayerSource, _target: Size) -> TwibbonResult<Arc<PreparedImage>> {
        match source {
            LayerSource::Image(img) => Ok(Arc::clone(img)),
            LayerSource::File(path) => self
                .0
                .get(path)
                .cloned()
                .ok_or_else(|| TwibbonError::decode_failed(path.clone(), "not found")),
        }
    }
}

fn pixels(w: u32, h: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> PreparedImage {
    PreparedImage::from_rgba(image::RgbaImage::from_fn(w, h, |x, y| image::Rgba(f(x, y))))
}

// 4x4 frame: slot 1 is red on the left half and clear on the right, slot 2 is
// reserved for the photo.
fn fixture() -> (Compositor<MapDecoder>, FrameSpec) {
    let top = pixels(4, 4, |x, _| if x < 2 { [255, 0, 0, 255] } else { [0, 0, 0, 0] });
    let decoder = MapDecoder(HashMap::from([("top.png".to_string(), Arc::new(top))]));
    let frame = FrameSpec::from_json_str(
        r#"{"width": 4, "height": 4, "layer_count": 2, "skip_indices": [2],
            "layers": {"1": "top.png"}}"#,
        ".",
    )
    .unwrap();
    (Compositor::with_threads(decoder, Some(2)).unwrap(), frame)
}

fn blue_photo() -> Photo {
    Photo::new(pixels(2, 2, |_, _| [0, 0, 255, 255]))
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn lower_slots_draw_on_top() {
    let (comp, frame) = fixture();
    let out = comp
        .composite(&CompositeRequest {
            frame,
            photo: Some(blue_photo()),
            state: TransformState::default(),
        })
        .unwrap();

    assert_eq!((out.width, out.height), (4, 4));
    assert_eq!(px(&out, 0, 0), [255, 0, 0, 255]);
    assert_eq!(px(&out, 3, 3), [0, 0, 255, 255]);
    assert_eq!(comp.output(), Some(out));
}

#[test]
fn without_photo_reserved_slot_stays_clear() {
    let (comp, frame) = fixture();
    let out = comp
        .composite(&CompositeRequest {
            frame,
            photo: None,
            state: TransformState::default(),
        })
        .unwrap();
    assert_eq!(px(&out, 3, 0), [0, 0, 0, 0]);
    assert_eq!(comp.cover_anchor(), None);
}

#[test]
fn decode_failure_keeps_previous_output() {
    let (comp, frame) = fixture();
    let good = CompositeRequest {
        frame: frame.clone(),
        photo: Some(blue_photo()),
        state: TransformState::default(),
    };
    let first = comp.composite(&good).unwrap();

    let mut broken = good.clone();
    broken.frame.layers.insert(1, "missing.png".to_string());
    let err = comp.composite(&broken).unwrap_err();
    assert!(matches!(err, TwibbonError::DecodeFailed { ref layer, .. } if layer == "missing.png"));
    assert!(!err.is_silent());
    assert_eq!(comp.output(), Some(first));
}

#[test]
fn superseded_ticket_is_cancelled() {
    let (comp, frame) = fixture();
    let req = CompositeRequest {
        frame,
        photo: Some(blue_photo()),
        state: TransformState::default(),
    };

    let old = comp.request();
    let new = comp.request();
    assert!(old.is_cancelled());
    assert!(!comp.is_current(&old));
    assert!(new.generation() > old.generation());

    let err = comp.render(&old, &req).unwrap_err();
    assert!(matches!(err, TwibbonError::CompositeCancelled));
    assert!(err.is_silent());
    assert_eq!(comp.output(), None);

    comp.render(&new, &req).unwrap();
    assert!(comp.output().is_some());
}

#[test]
fn explicitly_cancelled_ticket_publishes_nothing() {
    let (comp, frame) = fixture();
    let ticket = comp.request();
    ticket.cancel();
    let req = CompositeRequest {
        frame,
        photo: None,
        state: TransformState::default(),
    };
    assert!(matches!(
        comp.render(&ticket, &req),
        Err(TwibbonError::CompositeCancelled)
    ));
    assert_eq!(comp.output(), None);
}

#[test]
fn cover_anchor_is_kept_across_rescales() {
    let (comp, frame) = fixture();
    let photo = Photo::new(pixels(2, 1, |_, _| [0, 0, 255, 255]));
    let mut req = CompositeRequest {
        frame,
        photo: Some(photo),
        state: TransformState::default(),
    };
    comp.composite(&req).unwrap();
    let anchor = comp.cover_anchor().unwrap();
    assert_eq!(anchor.scale, 100.0);
    assert_eq!(anchor.rect, Rect::new(-2.0, 0.0, 6.0, 4.0));

    req.state = TransformState {
        scale: 250.0,
        position: Vec2::new(1.0, -1.0),
    };
    comp.composite(&req).unwrap();
    assert_eq!(comp.cover_anchor(), Some(anchor));

    req.photo = Some(Photo::new(pixels(1, 2, |_, _| [0, 0, 255, 255])));
    comp.composite(&req).unwrap();
    let fresh = comp.cover_anchor().unwrap();
    assert_eq!(fresh.scale, 250.0);
    assert_ne!(fresh, anchor);
}

#[test]
fn identical_requests_render_identical_bytes() {
    let (comp, frame) = fixture();
    let req = CompositeRequest {
        frame,
        photo: Some(Photo::new(pixels(7, 5, |x, y| {
            [(x * 30) as u8, (y * 40) as u8, 90, 255]
        }))),
        state: TransformState::default(),
    };
    let a = comp.composite(&req).unwrap();
    let b = comp.composite(&req).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn zero_threads_is_rejected() {
    let decoder = MapDecoder(HashMap::new());
    assert!(matches!(
        Compositor::with_threads(decoder, Some(0)),
        Err(TwibbonError::Validation(_))
    ));
}

#[test]
fn superseded_pass_leaves_cover_anchor_alone() {
    let (comp, frame) = fixture();
    let old = comp.request();
    let new = comp.request();

    let current = CompositeRequest {
        frame: frame.clone(),
        photo: Some(Photo::new(pixels(1, 2, |_, _| [0, 0, 255, 255]))),
        state: TransformState::default(),
    };
    comp.render(&new, &current).unwrap();
    let anchor = comp.cover_anchor().unwrap();
    assert_eq!(anchor.rect, Rect::new(0.0, -2.0, 4.0, 6.0));
    let published = comp.output();

    let stale = CompositeRequest {
        frame,
        photo: Some(Photo::new(pixels(2, 1, |_, _| [0, 255, 0, 255]))),
        state: TransformState {
            scale: 300.0,
            position: Vec2::ZERO,
        },
    };
    assert!(matches!(
        comp.render(&old, &stale),
        Err(TwibbonError::CompositeCancelled)
    ));
    assert_eq!(comp.cover_anchor(), Some(anchor));
    assert_eq!(comp.output(), published);
}

#[test]
fn failed_pass_does_not_establish_cover_anchor() {
    let (comp, frame) = fixture();
    let mut req = CompositeRequest {
        frame,
        photo: Some(blue_photo()),
        state: TransformState {
            scale: 250.0,
            position: Vec2::ZERO,
        },
    };
    req.frame.layers.insert(1, "missing.png".to_string());
    assert!(comp.composite(&req).is_err());
    assert_eq!(comp.cover_anchor(), None);
}
