//! Twibbon composes a user photo into a decorative multi-layer frame.
//!
//! The crate is the geometry and transform engine behind a "twibbon" editor: it
//! decides where a photo sits inside a fixed-aspect frame and renders the final
//! stacked image.
//!
//! # Pipeline overview
//!
//! 1. **Intake**: a [`FrameSpec`] (JSON manifest or a `layerN` directory) and a
//!    [`Photo`] validated by size and extension.
//! 2. **Plan** (optional): a [`DetectionWorker`] finds faces in the
//!    [`analysis_bitmap`]; [`plan_face_fit`] turns the first face into a
//!    starting [`TransformState`].
//! 3. **Edit**: a [`TransformSession`] tracks scale and pan in the preview box,
//!    re-deriving every placement from one contain-fit [`AnchorBox`].
//! 4. **Composite**: a [`Compositor`] stacks the layers at frame resolution with
//!    the photo cover-fitted under the user's transform.
//! 5. **Export**: [`encode_png`] / [`write_png`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Total geometry**: fitting, planning and session edits never fail; degenerate
//!   sizes produce zero-size results.
//! - **Premultiplied RGBA8** end-to-end; PNG export converts to straight alpha.
//! - **Latest wins**: a superseded composite is dropped, never shown.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod assets;
mod composite;
mod config;
mod detect;
mod export;
mod foundation;
mod frame;
mod geometry;
mod plan;
mod session;

pub use assets::decode::{PreparedImage, decode_image, parse_svg, rasterize_svg, svg_size};
pub use assets::photo::{Photo, analysis_bitmap, load_photo, validate_photo_file};
pub use assets::source::{FsLayerDecoder, LayerDecoder, LayerSource, normalize_rel_path};
pub use composite::compositor::{CompositeRequest, CompositeTicket, Compositor};
pub use composite::layers::{Layer, build_layers};
pub use config::settings::TwibbonConfig;
pub use detect::worker::{DetectionWorker, FaceDetector, PendingDetection, faces_or_empty};
pub use export::png::{encode_png, write_png};
pub use foundation::core::{
    AnchorBox, FrameRGBA, NATURAL_SCALE, PhotoId, Point, Rect, Size, TransformState, Vec2,
};
pub use foundation::error::{TwibbonError, TwibbonResult};
pub use frame::spec::{FrameSpec, LayerSlot, ManifestProgress};
pub use geometry::controller::ControllerBox;
pub use geometry::fit::{
    FitResult, FitSize, FitUnits, ScaleAxis, center_offset, cover_rect, fit_box,
    fit_box_anchored, fit_rect, fit_rect_anchored,
};
pub use geometry::padding::{estimate_max_padding, pad_rect};
pub use plan::face_fit::{FaceFit, plan_face_fit};
pub use session::transform::{ScaleLimits, TransformSession};
