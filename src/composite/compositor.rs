use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use rayon::prelude::*;

use crate::{
    assets::{decode::PreparedImage, photo::Photo, source::LayerDecoder},
    composite::{blend::draw_image, layers::build_layers},
    foundation::{
        core::{AnchorBox, FrameRGBA, NATURAL_SCALE, PhotoId, TransformState},
        error::{TwibbonError, TwibbonResult},
    },
    frame::spec::FrameSpec,
    geometry::fit::{cover_rect, fit_rect_anchored},
};

/// Everything one composite pass depends on.
#[derive(Clone, Debug)]
pub struct CompositeRequest {
    /// Frame to composite.
    pub frame: FrameSpec,
    /// User photo, if one is loaded.
    pub photo: Option<Photo>,
    /// Scale and frame-space pan of the photo.
    pub state: TransformState,
}

/// Handle of one requested composite pass.
///
/// A newer [`Compositor::request`] cancels every older ticket.
#[derive(Clone, Debug)]
pub struct CompositeTicket {
    generation: u64,
    cancel: Arc<AtomicBool>,
}

impl CompositeTicket {
    /// Monotonic request number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Abandon this pass.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether this pass was abandoned.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

type CoverKey = (PhotoId, u32, u32);

#[derive(Default)]
struct Shared {
    cover_anchor: Option<(CoverKey, AnchorBox)>,
    output: Option<Arc<FrameRGBA>>,
    active: Option<Arc<AtomicBool>>,
}

/// Multi-layer compositor with latest-wins cancellation.
///
/// Layer decodes run in parallel on the compositor's own rayon pool. A pass
/// draws into an off-screen buffer and publishes it only if no newer request
/// arrived meanwhile, so [`output`](Self::output) never shows a partial or
/// superseded frame.
pub struct Compositor<D> {
    decoder: D,
    pool: rayon::ThreadPool,
    generation: AtomicU64,
    shared: Mutex<Shared>,
}

impl<D: LayerDecoder> Compositor<D> {
    /// Compositor with one worker per core.
    pub fn new(decoder: D) -> TwibbonResult<Self> {
        Self::with_threads(decoder, None)
    }

    /// Compositor with an explicit worker count.
    pub fn with_threads(decoder: D, threads: Option<usize>) -> TwibbonResult<Self> {
        Ok(Self {
            decoder,
            pool: build_thread_pool(threads)?,
            generation: AtomicU64::new(0),
            shared: Mutex::new(Shared::default()),
        })
    }

    /// Layer decoder in use.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Start a new pass, cancelling the one in flight.
    pub fn request(&self) -> CompositeTicket {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut shared = self.shared();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(prev) = shared.active.replace(Arc::clone(&cancel)) {
            prev.store(true, Ordering::Release);
        }
        CompositeTicket { generation, cancel }
    }

    /// Whether `ticket` is the latest, uncancelled request.
    pub fn is_current(&self, ticket: &CompositeTicket) -> bool {
        !ticket.is_cancelled() && self.generation.load(Ordering::Acquire) == ticket.generation
    }

    /// Request and render in one step.
    pub fn composite(&self, req: &CompositeRequest) -> TwibbonResult<Arc<FrameRGBA>> {
        let ticket = self.request();
        self.render(&ticket, req)
    }

    /// Render the pass of `ticket`.
    ///
    /// Fails with [`TwibbonError::CompositeCancelled`] when superseded and with
    /// [`TwibbonError::DecodeFailed`] when any layer cannot be decoded; in both
    /// cases the previous output is kept.
    #[tracing::instrument(skip_all, fields(generation = ticket.generation))]
    pub fn render(
        &self,
        ticket: &CompositeTicket,
        req: &CompositeRequest,
    ) -> TwibbonResult<Arc<FrameRGBA>> {
        req.frame.validate()?;
        let target = req.frame.size();

        let mut layers = build_layers(&req.frame, req.photo.as_ref());
        let mut cover = None;
        if let Some(photo) = &req.photo {
            let (key, anchor) = self.cover_anchor_for(photo, &req.frame, req.state.scale);
            let rect = fit_rect_anchored(
                anchor.ratio_to(req.state.scale),
                target,
                anchor.rect + req.state.position,
            );
            for layer in layers.iter_mut().filter(|l| l.cover) {
                layer.draw_rect = rect;
            }
            cover = Some((key, anchor));
        }
        self.ensure_current(ticket)?;

        let decoded = self.pool.install(|| {
            layers
                .par_iter()
                .map(|layer| self.decoder.decode(&layer.source, target))
                .collect::<TwibbonResult<Vec<Arc<PreparedImage>>>>()
        });
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                self.ensure_current(ticket)?;
                tracing::warn!(error = %err, "layer decode failed, keeping previous output");
                return Err(err);
            }
        };
        self.ensure_current(ticket)?;

        let mut canvas = FrameRGBA::transparent(req.frame.width, req.frame.height);
        for (layer, image) in layers.iter().zip(&decoded).rev() {
            self.pool
                .install(|| draw_image(&mut canvas, image, layer.draw_rect));
            self.ensure_current(ticket)?;
        }

        let mut shared = self.shared();
        if !self.is_current(ticket) {
            return Err(TwibbonError::CompositeCancelled);
        }
        let out = Arc::new(canvas);
        shared.output = Some(Arc::clone(&out));
        if let Some(entry) = cover {
            shared.cover_anchor = Some(entry);
        }
        if shared
            .active
            .as_ref()
            .is_some_and(|a| Arc::ptr_eq(a, &ticket.cancel))
        {
            shared.active = None;
        }
        tracing::debug!(layers = layers.len(), "composite published");
        Ok(out)
    }

    /// Last published frame.
    pub fn output(&self) -> Option<Arc<FrameRGBA>> {
        self.shared().output.clone()
    }

    /// Cover anchor in use, if one was established.
    pub fn cover_anchor(&self) -> Option<AnchorBox> {
        self.shared().cover_anchor.map(|(_, anchor)| anchor)
    }

    // The cover anchor is set by the first published pass for a photo and
    // frame size; later passes rescale from it. Nothing is stored here.
    fn cover_anchor_for(
        &self,
        photo: &Photo,
        frame: &FrameSpec,
        scale: f64,
    ) -> (CoverKey, AnchorBox) {
        let key = (photo.id, frame.width, frame.height);
        if let Some((k, anchor)) = self.shared().cover_anchor
            && k == key
        {
            return (key, anchor);
        }
        let scale = if scale > 0.0 { scale } else { NATURAL_SCALE };
        tracing::debug!(photo = photo.id.as_u64(), scale, "new cover anchor");
        let anchor = AnchorBox {
            rect: cover_rect(scale, frame.size(), photo.image.size()),
            scale,
        };
        (key, anchor)
    }

    fn ensure_current(&self, ticket: &CompositeTicket) -> TwibbonResult<()> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            tracing::debug!("composite superseded");
            Err(TwibbonError::CompositeCancelled)
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn build_thread_pool(threads: Option<usize>) -> TwibbonResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(TwibbonError::validation(
            "compositor threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        TwibbonError::Other(anyhow::anyhow!("failed to build compositor thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
