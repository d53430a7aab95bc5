use super::*;

fn square_controller() -> ControllerBox {
    // 1000x1000 frame previewed at 250 px: ratio 4.
    ControllerBox::for_frame(250.0, 1000, 1000)
}

const ANALYSIS: Size = Size::new(600.0, 600.0);

#[test]
fn no_faces_means_no_update() {
    let cfg = TwibbonConfig::default();
    assert_eq!(plan_face_fit(&[], ANALYSIS, &square_controller(), &cfg), None);
}

#[test]
fn centered_face_zooms_without_pan() {
    let cfg = TwibbonConfig::default();
    let face = Rect::new(250.0, 250.0, 350.0, 350.0);
    let fit = plan_face_fit(&[face], ANALYSIS, &square_controller(), &cfg).unwrap();
    // Padded to 350 px tall; 350 analysis px -> 145.83 controller px; 250 / 145.83.
    assert_eq!(fit.scale, 171.0);
    assert_eq!(fit.position, Vec2::ZERO);
}

#[test]
fn off_center_face_is_panned_into_view() {
    let cfg = TwibbonConfig::default();
    // Padding capped at 3x by the 100 px gap on the left.
    let face = Rect::new(100.0, 250.0, 200.0, 350.0);
    let fit = plan_face_fit(&[face], ANALYSIS, &square_controller(), &cfg).unwrap();
    assert_eq!(fit.scale, 200.0);
    // 150 analysis px * zoom 2 * (250/600) = 125 controller px, times ratio 4.
    assert_eq!(fit.position, Vec2::new(500.0, 0.0));
}

#[test]
fn only_first_face_counts() {
    let cfg = TwibbonConfig::default();
    let first = Rect::new(250.0, 250.0, 350.0, 350.0);
    let second = Rect::new(0.0, 0.0, 10.0, 10.0);
    let a = plan_face_fit(&[first], ANALYSIS, &square_controller(), &cfg);
    let b = plan_face_fit(&[first, second], ANALYSIS, &square_controller(), &cfg);
    assert_eq!(a, b);
}

#[test]
fn oversized_zoom_is_rejected() {
    let cfg = TwibbonConfig::default();
    let tiny = Rect::new(298.0, 298.0, 303.0, 303.0);
    assert_eq!(plan_face_fit(&[tiny], ANALYSIS, &square_controller(), &cfg), None);

    let strict = TwibbonConfig {
        max_scale: 150.0,
        ..TwibbonConfig::default()
    };
    let face = Rect::new(250.0, 250.0, 350.0, 350.0);
    assert_eq!(plan_face_fit(&[face], ANALYSIS, &square_controller(), &strict), None);
}

#[test]
fn never_exceeds_max_scale() {
    let cfg = TwibbonConfig::default();
    for size in [1.0, 5.0, 20.0, 50.0, 120.0, 300.0, 600.0] {
        let face = Rect::from_origin_size(Point::new(0.0, 0.0), Size::new(size, size));
        if let Some(fit) = plan_face_fit(&[face], ANALYSIS, &square_controller(), &cfg) {
            assert!(fit.scale <= cfg.max_scale, "size {size} gave {}", fit.scale);
        }
    }
}

#[test]
fn degenerate_face_falls_back_to_natural_fit() {
    let cfg = TwibbonConfig::default();
    let point = Rect::new(300.0, 300.0, 300.0, 300.0);
    let fit = plan_face_fit(&[point], ANALYSIS, &square_controller(), &cfg).unwrap();
    assert_eq!(fit.scale, 100.0);
    assert_eq!(fit.position, Vec2::ZERO);
}

#[test]
fn whole_image_face_stays_at_natural_fit() {
    let cfg = TwibbonConfig::default();
    let face = Rect::new(0.0, 0.0, 600.0, 600.0);
    let fit = plan_face_fit(&[face], ANALYSIS, &square_controller(), &cfg).unwrap();
    assert_eq!(fit.scale, 100.0);
    assert_eq!(fit.position, Vec2::ZERO);
}

#[test]
fn empty_analysis_bitmap_yields_nothing() {
    let cfg = TwibbonConfig::default();
    let face = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(
        plan_face_fit(&[face], Size::ZERO, &square_controller(), &cfg),
        None
    );
}

#[test]
fn zoom_wider_than_a_portrait_photo_falls_back() {
    let cfg = TwibbonConfig::default();
    // 300x600 photo in a square preview: the view stays inside the photo
    // width only from zoom 2 on.
    let portrait = Size::new(300.0, 600.0);

    // Padded to 175x350; zoom 1.71 would show past both photo edges.
    let face = Rect::new(125.0, 150.0, 175.0, 250.0);
    let fit = plan_face_fit(&[face], portrait, &square_controller(), &cfg).unwrap();
    assert_eq!(fit.scale, 100.0);
    // 100 analysis px * (250/600) = 41.67 controller px, times ratio 4.
    assert_eq!(fit.position, Vec2::new(0.0, 167.0));

    // Padded to 70x140; zoom 4.29 keeps the view inside the photo.
    let small = Rect::new(140.0, 280.0, 160.0, 320.0);
    let fit = plan_face_fit(&[small], portrait, &square_controller(), &cfg).unwrap();
    assert_eq!(fit.scale, 429.0);
    assert_eq!(fit.position, Vec2::ZERO);
}
