//! Baseline comparison
//!
//! Decides between creating a baseline, normalising a capture whose size drifted,
//! and a perceptual pixel diff. In approval mode a clean comparison also promotes
//! the capture to baseline.

use crate::pixelmatch::{pixelmatch, PixelmatchOptions};
use crate::types::{CompareMode, ComparisonResult, ImageArtifactPaths};
use crate::Result;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, info, warn};

pub const BASELINE_CREATED: &str = "Baseline created.";

/// Opacity of the capture drawn into the diff image after approval
const APPROVED_OVERLAY_ALPHA: u8 = 128;

/// Colour of the area left uncovered by a contain fit
const PADDING: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Per-pixel perceptual threshold from 0 to 1
    pub threshold: f64,

    /// Mismatched pixels tolerated before a target counts as changed
    pub max_diff_pixels: u64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            max_diff_pixels: 100,
        }
    }
}

pub struct Comparator {
    options: CompareOptions,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Compare the current capture of a target against its baseline.
    pub fn compare(&self, paths: &ImageArtifactPaths, mode: CompareMode) -> Result<ComparisonResult> {
        if !paths.baseline.exists() {
            info!("📸 No baseline found, creating one");
            std::fs::copy(&paths.current, &paths.baseline)?;
            return Ok(ComparisonResult {
                changed: false,
                diff_pixel_count: 0,
                message: Some(BASELINE_CREATED.to_string()),
            });
        }

        let baseline = load_rgba(&paths.baseline)?;
        let mut current = load_rgba(&paths.current)?;

        if baseline.dimensions() != current.dimensions() {
            let (width, height) = baseline.dimensions();
            warn!(
                "⚠️ Image sizes differ ({}x{} vs {}x{}), resizing current image",
                width,
                height,
                current.width(),
                current.height()
            );
            normalize_to(&current, width, height).save(&paths.current)?;
            current = load_rgba(&paths.current)?;
        }

        let pixel_options = PixelmatchOptions {
            threshold: self.options.threshold,
            ..Default::default()
        };
        let diff = pixelmatch(&baseline, &current, &pixel_options)?;
        diff.image.save(&paths.diff)?;

        let changed = diff.diff_pixels > self.options.max_diff_pixels;
        debug!(
            "{} mismatched pixels (limit {})",
            diff.diff_pixels, self.options.max_diff_pixels
        );

        if !changed && mode == CompareMode::Approve {
            std::fs::copy(&paths.current, &paths.baseline)?;
            approved_overlay(&current).save(&paths.diff)?;
            info!("Baseline refreshed from current capture");
        }

        Ok(ComparisonResult {
            changed,
            diff_pixel_count: diff.diff_pixels,
            message: None,
        })
    }
}

fn load_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Fit an image inside `width` x `height` without cropping or distortion.
///
/// The image is scaled by the largest factor that keeps it inside the box, centred,
/// and the remaining area is padded.
pub fn normalize_to(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_width, src_height) = img.dimensions();
    let scale = f64::min(
        width as f64 / src_width as f64,
        height as f64 / src_height as f64,
    );

    let fit_width = ((src_width as f64 * scale).round() as u32).clamp(1, width);
    let fit_height = ((src_height as f64 * scale).round() as u32).clamp(1, height);

    let mut canvas = RgbaImage::from_pixel(width, height, PADDING);
    let left = ((width - fit_width) / 2) as i64;
    let top = ((height - fit_height) / 2) as i64;

    if (fit_width, fit_height) == (src_width, src_height) {
        imageops::replace(&mut canvas, img, left, top);
    } else {
        let scaled = imageops::resize(img, fit_width, fit_height, FilterType::Lanczos3);
        imageops::replace(&mut canvas, &scaled, left, top);
    }

    canvas
}

/// The capture at half opacity, marking a refreshed baseline
fn approved_overlay(current: &RgbaImage) -> RgbaImage {
    let mut overlay = current.clone();
    for px in overlay.pixels_mut() {
        px[3] = APPROVED_OVERLAY_ALPHA;
    }
    overlay
}
