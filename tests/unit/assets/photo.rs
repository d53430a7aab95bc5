use std::io::Cursor;
use std::path::PathBuf;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "twibbon_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &Path, w: u32, h: u32) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 100, 50, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn rejects_unsupported_extension_and_oversize() {
    let tmp = temp_dir("photo_validate");
    std::fs::create_dir_all(&tmp).unwrap();

    let gif = tmp.join("me.gif");
    std::fs::write(&gif, b"GIF89a").unwrap();
    let cfg = TwibbonConfig::default();
    assert!(matches!(
        validate_photo_file(&gif, &cfg),
        Err(TwibbonError::Validation(_))
    ));

    let png = tmp.join("me.PNG");
    write_png(&png, 4, 4);
    validate_photo_file(&png, &cfg).unwrap();

    let tiny = TwibbonConfig {
        max_photo_bytes: 8,
        ..TwibbonConfig::default()
    };
    assert!(matches!(
        validate_photo_file(&png, &tiny),
        Err(TwibbonError::Validation(_))
    ));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn load_photo_assigns_fresh_ids() {
    let tmp = temp_dir("photo_load");
    std::fs::create_dir_all(&tmp).unwrap();
    let png = tmp.join("me.png");
    write_png(&png, 6, 3);

    let cfg = TwibbonConfig::default();
    let a = load_photo(&png, &cfg).unwrap();
    let b = load_photo(&png, &cfg).unwrap();
    assert_eq!((a.image.width, a.image.height), (6, 3));
    assert_ne!(a.id, b.id);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn analysis_bitmap_bounds_long_edge() {
    let photo = Photo::new(PreparedImage::from_rgba(image::RgbaImage::from_pixel(
        1200,
        800,
        image::Rgba([1, 2, 3, 255]),
    )));
    let small = analysis_bitmap(&photo, 600);
    assert_eq!(small.dimensions(), (600, 400));

    let kept = analysis_bitmap(&photo, 2000);
    assert_eq!(kept.dimensions(), (1200, 800));
    assert_eq!(kept.get_pixel(0, 0).0, [1, 2, 3, 255]);
}
