use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::JoinHandle,
};

use anyhow::Context as _;

use crate::foundation::{
    core::Rect,
    error::{TwibbonError, TwibbonResult},
};

/// A face detection model.
///
/// The worker owns the detector on its own thread; implementations need not be
/// `Sync`.
pub trait FaceDetector: Send + 'static {
    /// Load models or other one-time state.
    fn init(&mut self) -> anyhow::Result<()>;

    /// Face boxes in `bitmap` pixel coordinates, most prominent first.
    fn detect(&mut self, bitmap: &image::RgbaImage) -> anyhow::Result<Vec<Rect>>;
}

type Reply<T> = mpsc::Sender<Result<T, String>>;

enum Command {
    Init(Reply<()>),
    Detect {
        bitmap: image::RgbaImage,
        reply: Reply<Vec<Rect>>,
    },
}

/// Background thread running a [`FaceDetector`], one request at a time.
pub struct DetectionWorker {
    tx: Option<mpsc::Sender<Command>>,
    ready: OnceLock<Result<(), String>>,
    in_flight: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// An accepted detection request.
#[derive(Debug)]
#[must_use = "the detector stays busy until the reply is received or dropped"]
pub struct PendingDetection {
    rx: mpsc::Receiver<Result<Vec<Rect>, String>>,
}

impl PendingDetection {
    /// Block until the worker replies.
    pub fn wait(self) -> TwibbonResult<Vec<Rect>> {
        match self.rx.recv() {
            Ok(Ok(faces)) => Ok(faces),
            Ok(Err(msg)) => Err(TwibbonError::detection_failed(msg)),
            Err(_) => Err(TwibbonError::detection_failed("detection worker stopped")),
        }
    }
}

impl DetectionWorker {
    /// Move `detector` onto a dedicated thread.
    pub fn spawn<F: FaceDetector>(detector: F) -> TwibbonResult<Self> {
        let (tx, rx) = mpsc::channel::<Command>();
        let in_flight = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&in_flight);

        let handle = std::thread::Builder::new()
            .name("twibbon-detect".to_string())
            .spawn(move || run(detector, rx, flag))
            .context("spawn detection worker thread")?;

        Ok(Self {
            tx: Some(tx),
            ready: OnceLock::new(),
            in_flight,
            handle: Some(handle),
        })
    }

    /// One-time handshake with the detector.
    ///
    /// Concurrent and repeated calls share the outcome of the first one,
    /// including a failure.
    #[tracing::instrument(skip_all)]
    pub fn init(&self) -> TwibbonResult<()> {
        let outcome = self.ready.get_or_init(|| {
            let (reply, rx) = mpsc::channel();
            self.send(Command::Init(reply))?;
            rx.recv()
                .map_err(|_| "detection worker stopped".to_string())
                .and_then(|r| r)
        });
        match outcome {
            Ok(()) => Ok(()),
            Err(msg) => Err(TwibbonError::detection_failed(msg.clone())),
        }
    }

    /// Whether [`init`](Self::init) completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.ready.get(), Some(Ok(())))
    }

    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit `bitmap` for detection.
    ///
    /// Fails fast with [`TwibbonError::DetectorNotReady`] before a successful
    /// init and with [`TwibbonError::DetectionBusy`] while another request is
    /// outstanding; nothing is queued in either case. A stopped worker reports
    /// [`TwibbonError::DetectionFailed`].
    #[tracing::instrument(skip_all, fields(width = bitmap.width(), height = bitmap.height()))]
    pub fn detect(&self, bitmap: image::RgbaImage) -> TwibbonResult<PendingDetection> {
        match self.ready.get() {
            Some(Ok(())) => {}
            Some(Err(msg)) => return Err(TwibbonError::detection_failed(msg.clone())),
            None => return Err(TwibbonError::DetectorNotReady),
        }
        if self.handle.as_ref().is_none_or(JoinHandle::is_finished) {
            return Err(TwibbonError::detection_failed("detection worker stopped"));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("detection busy");
            return Err(TwibbonError::DetectionBusy);
        }

        let (reply, rx) = mpsc::channel();
        if let Err(msg) = self.send(Command::Detect { bitmap, reply }) {
            self.in_flight.store(false, Ordering::Release);
            return Err(TwibbonError::detection_failed(msg));
        }
        Ok(PendingDetection { rx })
    }

    fn send(&self, cmd: Command) -> Result<(), String> {
        self.tx
            .as_ref()
            .ok_or_else(|| "detection worker stopped".to_string())?
            .send(cmd)
            .map_err(|_| "detection worker stopped".to_string())
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("detection worker panicked");
        }
    }
}

impl std::fmt::Debug for DetectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionWorker")
            .field("ready", &self.ready.get())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

// A panicking detector is reported as a failed request; the worker keeps
// serving and the in-flight slot is always released.
fn run<F: FaceDetector>(mut detector: F, rx: mpsc::Receiver<Command>, in_flight: Arc<AtomicBool>) {
    for cmd in rx {
        match cmd {
            Command::Init(reply) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| detector.init()))
                    .map_err(panic_message)
                    .and_then(|r| r.map_err(|e| format!("{e:#}")));
                let _ = reply.send(outcome);
            }
            Command::Detect { bitmap, reply } => {
                let outcome = catch_unwind(AssertUnwindSafe(|| detector.detect(&bitmap)))
                    .map_err(panic_message)
                    .and_then(|r| r.map_err(|e| format!("{e:#}")));
                // Release the slot before replying so the caller can resubmit
                // as soon as it has the answer.
                in_flight.store(false, Ordering::Release);
                let _ = reply.send(outcome);
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%detail, "face detector panicked");
    format!("face detector panicked: {detail}")
}

/// Treat a detector failure as "no faces"; other errors pass through.
pub fn faces_or_empty(result: TwibbonResult<Vec<Rect>>) -> TwibbonResult<Vec<Rect>> {
    match result {
        Err(TwibbonError::DetectionFailed(msg)) => {
            tracing::warn!(error = %msg, "face detection failed, continuing without faces");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/detect/worker.rs"]
mod tests;
