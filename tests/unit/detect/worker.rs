use std::sync::atomic::AtomicUsize;

use super::*;

struct Gated {
    gate: mpsc::Receiver<()>,
    inits: Arc<AtomicUsize>,
    fail_init: bool,
}

impl FaceDetector for Gated {
    fn init(&mut self) -> anyhow::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            anyhow::bail!("model missing");
        }
        Ok(())
    }

    fn detect(&mut self, bitmap: &image::RgbaImage) -> anyhow::Result<Vec<Rect>> {
        let _ = self.gate.recv();
        if bitmap.width() == 0 {
            anyhow::bail!("empty bitmap");
        }
        Ok(vec![Rect::new(1.0, 2.0, 3.0, 4.0)])
    }
}

fn worker(fail_init: bool) -> (DetectionWorker, mpsc::Sender<()>, Arc<AtomicUsize>) {
    let (open, gate) = mpsc::channel();
    let inits = Arc::new(AtomicUsize::new(0));
    let w = DetectionWorker::spawn(Gated {
        gate,
        inits: Arc::clone(&inits),
        fail_init,
    })
    .unwrap();
    (w, open, inits)
}

fn bitmap() -> image::RgbaImage {
    image::RgbaImage::new(8, 8)
}

#[test]
fn detect_before_init_is_not_ready() {
    let (w, _open, _) = worker(false);
    assert!(!w.is_ready());
    assert!(matches!(
        w.detect(bitmap()),
        Err(TwibbonError::DetectorNotReady)
    ));
}

#[test]
fn second_request_while_busy_fails_fast() {
    let (w, open, _) = worker(false);
    w.init().unwrap();

    let first = w.detect(bitmap()).unwrap();
    assert!(w.is_busy());
    let second = w.detect(bitmap());
    assert!(matches!(second, Err(TwibbonError::DetectionBusy)));
    assert!(second.unwrap_err().is_silent());

    open.send(()).unwrap();
    assert_eq!(first.wait().unwrap(), vec![Rect::new(1.0, 2.0, 3.0, 4.0)]);
    assert!(!w.is_busy());

    open.send(()).unwrap();
    assert_eq!(w.detect(bitmap()).unwrap().wait().unwrap().len(), 1);
}

#[test]
fn init_runs_once_for_concurrent_callers() {
    let (w, _open, inits) = worker(false);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| w.init().unwrap());
        }
    });
    w.init().unwrap();
    assert!(w.is_ready());
    assert_eq!(inits.load(Ordering::SeqCst), 1);
}

#[test]
fn init_failure_is_shared() {
    let (w, _open, inits) = worker(true);
    assert!(matches!(w.init(), Err(TwibbonError::DetectionFailed(_))));
    assert!(matches!(w.init(), Err(TwibbonError::DetectionFailed(_))));
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert!(matches!(
        w.detect(bitmap()),
        Err(TwibbonError::DetectionFailed(_))
    ));
}

#[test]
fn detector_error_degrades_to_no_faces() {
    let (w, open, _) = worker(false);
    w.init().unwrap();

    open.send(()).unwrap();
    let result = w.detect(image::RgbaImage::new(0, 0)).unwrap().wait();
    assert!(
        matches!(result, Err(TwibbonError::DetectionFailed(ref m)) if m.contains("empty bitmap"))
    );
    assert_eq!(faces_or_empty(result).unwrap(), Vec::<Rect>::new());
    assert!(!w.is_busy());
}

#[test]
fn busy_is_not_swallowed() {
    assert!(matches!(
        faces_or_empty(Err(TwibbonError::DetectionBusy)),
        Err(TwibbonError::DetectionBusy)
    ));
    let faces = vec![Rect::new(0.0, 0.0, 1.0, 1.0)];
    assert_eq!(faces_or_empty(Ok(faces.clone())).unwrap(), faces);
}

struct Panicky;

impl FaceDetector for Panicky {
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn detect(&mut self, bitmap: &image::RgbaImage) -> anyhow::Result<Vec<Rect>> {
        if bitmap.width() == 0 {
            panic!("model crashed");
        }
        Ok(Vec::new())
    }
}

#[test]
fn panicking_detector_fails_the_request_and_frees_the_slot() {
    let w = DetectionWorker::spawn(Panicky).unwrap();
    w.init().unwrap();

    let result = w.detect(image::RgbaImage::new(0, 0)).unwrap().wait();
    assert!(
        matches!(result, Err(TwibbonError::DetectionFailed(ref m)) if m.contains("model crashed"))
    );
    assert!(!w.is_busy());

    let again = w.detect(bitmap());
    assert!(!matches!(again, Err(TwibbonError::DetectionBusy)));
    assert_eq!(again.unwrap().wait().unwrap(), Vec::<Rect>::new());
}
