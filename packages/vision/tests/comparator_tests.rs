/// Comparator behaviour against real files on disk
use connect_vision::{
    ArtifactStore, Comparator, CompareMode, CompareOptions, ImageArtifactPaths, BASELINE_CREATED,
};
use image::{Rgba, RgbaImage};
use tempfile::{tempdir, TempDir};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn setup() -> (TempDir, ImageArtifactPaths) {
    let temp = tempdir().unwrap();
    let store = ArtifactStore::new(temp.path().join("screenshots"));
    let paths = store.resolve("demo", "search", "desktop").unwrap();
    (temp, paths)
}

/// White image with `count` isolated black pixels
fn with_changed_pixels(width: u32, height: u32, count: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, WHITE);
    let columns = (width - 1) / 2;
    for k in 0..count {
        let x = (k % columns) * 2 + 1;
        let y = (k / columns) * 2 + 1;
        assert!(y < height - 1, "image too small for {} pixels", count);
        img.put_pixel(x, y, BLACK);
    }
    img
}

fn comparator() -> Comparator {
    Comparator::new(CompareOptions::default())
}

#[test]
fn test_first_run_creates_baseline() {
    let (_temp, paths) = setup();
    with_changed_pixels(40, 40, 3).save(&paths.current).unwrap();

    let result = comparator().compare(&paths, CompareMode::Check).unwrap();

    assert!(!result.changed);
    assert_eq!(result.message.as_deref(), Some(BASELINE_CREATED));
    assert_eq!(
        std::fs::read(&paths.baseline).unwrap(),
        std::fs::read(&paths.current).unwrap()
    );
    assert!(!paths.diff.exists());
}

#[test]
fn test_identical_images_have_no_diff() {
    let (_temp, paths) = setup();
    let img = with_changed_pixels(40, 40, 10);
    img.save(&paths.baseline).unwrap();
    img.save(&paths.current).unwrap();

    let result = comparator().compare(&paths, CompareMode::Check).unwrap();

    assert_eq!(result.diff_pixel_count, 0);
    assert!(!result.changed);
    assert_eq!(result.message, None);
    assert!(paths.diff.exists());
}

#[test]
fn test_threshold_is_strictly_greater_than_100() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(64, 64, WHITE)
        .save(&paths.baseline)
        .unwrap();

    with_changed_pixels(64, 64, 100).save(&paths.current).unwrap();
    let at_limit = comparator().compare(&paths, CompareMode::Check).unwrap();
    assert_eq!(at_limit.diff_pixel_count, 100);
    assert!(!at_limit.changed);

    with_changed_pixels(64, 64, 101).save(&paths.current).unwrap();
    let over_limit = comparator().compare(&paths, CompareMode::Check).unwrap();
    assert_eq!(over_limit.diff_pixel_count, 101);
    assert!(over_limit.changed);
}

#[test]
fn test_height_mismatch_is_normalised() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(1440, 900, WHITE)
        .save(&paths.baseline)
        .unwrap();
    RgbaImage::from_pixel(1440, 850, Rgba([30, 60, 90, 255]))
        .save(&paths.current)
        .unwrap();

    comparator().compare(&paths, CompareMode::Check).unwrap();

    let normalised = image::open(&paths.current).unwrap().to_rgba8();
    assert_eq!(normalised.dimensions(), (1440, 900));
    // Content is centred at its original scale
    assert_eq!(*normalised.get_pixel(720, 25), Rgba([30, 60, 90, 255]));
    assert_eq!(*normalised.get_pixel(720, 874), Rgba([30, 60, 90, 255]));
    assert_eq!(*normalised.get_pixel(720, 10), BLACK);

    let diff = image::open(&paths.diff).unwrap();
    assert_eq!((diff.width(), diff.height()), (1440, 900));
}

#[test]
fn test_scenario_large_change_is_reported() {
    let (_temp, paths) = setup();
    let baseline = RgbaImage::from_pixel(200, 200, WHITE);
    baseline.save(&paths.baseline).unwrap();
    let baseline_bytes = std::fs::read(&paths.baseline).unwrap();

    with_changed_pixels(200, 200, 5000).save(&paths.current).unwrap();
    let result = comparator().compare(&paths, CompareMode::Check).unwrap();

    assert!(result.changed);
    assert_eq!(result.diff_pixel_count, 5000);
    assert_eq!(std::fs::read(&paths.baseline).unwrap(), baseline_bytes);

    let diff = image::open(&paths.diff).unwrap().to_rgba8();
    assert_eq!(*diff.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
    assert_ne!(*diff.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
}

#[test]
fn test_scenario_small_change_is_tolerated() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(64, 64, WHITE)
        .save(&paths.baseline)
        .unwrap();
    let baseline_bytes = std::fs::read(&paths.baseline).unwrap();

    with_changed_pixels(64, 64, 50).save(&paths.current).unwrap();
    let result = comparator().compare(&paths, CompareMode::Check).unwrap();

    assert!(!result.changed);
    assert_eq!(result.diff_pixel_count, 50);
    assert_eq!(std::fs::read(&paths.baseline).unwrap(), baseline_bytes);
}

#[test]
fn test_approve_mode_refreshes_clean_baseline() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(64, 64, WHITE)
        .save(&paths.baseline)
        .unwrap();
    with_changed_pixels(64, 64, 20).save(&paths.current).unwrap();

    let result = comparator().compare(&paths, CompareMode::Approve).unwrap();

    assert!(!result.changed);
    assert_eq!(
        std::fs::read(&paths.baseline).unwrap(),
        std::fs::read(&paths.current).unwrap()
    );

    let overlay = image::open(&paths.diff).unwrap().to_rgba8();
    assert_eq!(*overlay.get_pixel(0, 0), Rgba([255, 255, 255, 128]));
    assert_eq!(*overlay.get_pixel(1, 1), Rgba([0, 0, 0, 128]));
}

#[test]
fn test_approve_mode_keeps_baseline_when_changed() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(64, 64, WHITE)
        .save(&paths.baseline)
        .unwrap();
    let baseline_bytes = std::fs::read(&paths.baseline).unwrap();
    with_changed_pixels(64, 64, 500).save(&paths.current).unwrap();

    let result = comparator().compare(&paths, CompareMode::Approve).unwrap();

    assert!(result.changed);
    assert_eq!(std::fs::read(&paths.baseline).unwrap(), baseline_bytes);
}

#[test]
fn test_corrupt_baseline_is_an_error() {
    let (_temp, paths) = setup();
    std::fs::write(&paths.baseline, b"not a png").unwrap();
    RgbaImage::from_pixel(8, 8, WHITE).save(&paths.current).unwrap();

    assert!(comparator().compare(&paths, CompareMode::Check).is_err());
}

#[test]
fn test_custom_pixel_budget() {
    let (_temp, paths) = setup();
    RgbaImage::from_pixel(64, 64, WHITE)
        .save(&paths.baseline)
        .unwrap();
    with_changed_pixels(64, 64, 50).save(&paths.current).unwrap();

    let strict = Comparator::new(CompareOptions {
        max_diff_pixels: 10,
        ..Default::default()
    });
    assert!(strict.compare(&paths, CompareMode::Check).unwrap().changed);
}
