//! Perceptual per-pixel image diff
//!
//! Pixels are compared with a YIQ colour distance so that differences the eye barely
//! notices fall under the threshold. Pixels that look like anti-aliasing along an
//! edge are painted in the diff image but not counted.

use crate::{Result, VisionError};
use image::{Rgba, RgbaImage};

/// Maximum possible YIQ delta between two colours
const MAX_YIQ_DELTA: f64 = 35215.0;

#[derive(Debug, Clone)]
pub struct PixelmatchOptions {
    /// Matching threshold from 0 to 1, smaller is more sensitive
    pub threshold: f64,

    /// Count anti-aliased pixels as differences
    pub include_aa: bool,

    /// Opacity of unchanged pixels in the diff image
    pub alpha: f64,

    pub aa_color: [u8; 3],
    pub diff_color: [u8; 3],
}

impl Default for PixelmatchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_aa: false,
            alpha: 0.1,
            aa_color: [255, 255, 0],
            diff_color: [255, 0, 0],
        }
    }
}

/// Diff image plus the number of mismatched pixels
#[derive(Debug, Clone)]
pub struct PixelDiff {
    pub diff_pixels: u64,
    pub image: RgbaImage,
}

/// Compare two images of identical dimensions.
///
/// Returns [`VisionError::SizeMismatch`] when the dimensions differ; callers
/// normalise sizes first.
pub fn pixelmatch(
    expected: &RgbaImage,
    actual: &RgbaImage,
    options: &PixelmatchOptions,
) -> Result<PixelDiff> {
    if expected.dimensions() != actual.dimensions() {
        return Err(VisionError::SizeMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        });
    }

    let (width, height) = expected.dimensions();
    let mut output = RgbaImage::new(width, height);

    if expected.as_raw() == actual.as_raw() {
        for (x, y, px) in expected.enumerate_pixels() {
            output.put_pixel(x, y, gray_pixel(px, options.alpha));
        }
        return Ok(PixelDiff {
            diff_pixels: 0,
            image: output,
        });
    }

    let max_delta = MAX_YIQ_DELTA * options.threshold * options.threshold;
    let mut diff_pixels = 0u64;

    for y in 0..height {
        for x in 0..width {
            let a = expected.get_pixel(x, y);
            let b = actual.get_pixel(x, y);
            let delta = color_delta(a, b, false);

            if delta.abs() > max_delta {
                if !options.include_aa
                    && (antialiased(expected, x, y, actual) || antialiased(actual, x, y, expected))
                {
                    output.put_pixel(x, y, solid(options.aa_color));
                } else {
                    output.put_pixel(x, y, solid(options.diff_color));
                    diff_pixels += 1;
                }
            } else {
                output.put_pixel(x, y, gray_pixel(a, options.alpha));
            }
        }
    }

    Ok(PixelDiff {
        diff_pixels,
        image: output,
    })
}

fn solid(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

fn gray_pixel(px: &Rgba<u8>, alpha: f64) -> Rgba<u8> {
    let [r, g, b, a] = px.0;
    let luma = rgb_to_y(r as f64, g as f64, b as f64);
    let value = blend(luma, alpha * a as f64 / 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba([value, value, value, 255])
}

/// Blend a channel value with white
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn rgb_to_y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb_to_i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb_to_q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

fn premultiplied(px: &Rgba<u8>) -> (f64, f64, f64) {
    let [r, g, b, a] = px.0;
    let (r, g, b) = (r as f64, g as f64, b as f64);
    if a < 255 {
        let a = a as f64 / 255.0;
        (blend(r, a), blend(g, a), blend(b, a))
    } else {
        (r, g, b)
    }
}

/// Squared YIQ distance between two pixels.
///
/// The sign tells whether the first pixel is lighter (negative) or darker. With
/// `y_only` only the brightness difference is returned.
pub fn color_delta(a: &Rgba<u8>, b: &Rgba<u8>, y_only: bool) -> f64 {
    if a == b {
        return 0.0;
    }

    let (r1, g1, b1) = premultiplied(a);
    let (r2, g2, b2) = premultiplied(b);

    let y1 = rgb_to_y(r1, g1, b1);
    let y2 = rgb_to_y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb_to_i(r1, g1, b1) - rgb_to_i(r2, g2, b2);
    let q = rgb_to_q(r1, g1, b1) - rgb_to_q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// Bounds of the 3x3 neighbourhood around a pixel, clamped to the image
fn neighbourhood(img: &RgbaImage, x: u32, y: u32) -> (u32, u32, u32, u32) {
    let (width, height) = img.dimensions();
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

/// Whether the pixel at (x, y) looks like anti-aliasing in `img`.
///
/// An anti-aliased pixel sits between a darkest and a brightest neighbour, and at
/// least one of those extremes lies in a flat region in both images.
fn antialiased(img: &RgbaImage, x: u32, y: u32, other: &RgbaImage) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(img, x, y);
    let center = img.get_pixel(x, y);

    let mut zeroes = u32::from(x == x0 || x == x2 || y == y0 || y == y2);
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (0, 0);
    let mut max_at = (0, 0);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }

            let delta = color_delta(center, img.get_pixel(nx, ny), true);

            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (nx, ny);
            } else if delta > max {
                max = delta;
                max_at = (nx, ny);
            }
        }
    }

    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at.0, min_at.1) && has_many_siblings(other, min_at.0, min_at.1))
        || (has_many_siblings(img, max_at.0, max_at.1)
            && has_many_siblings(other, max_at.0, max_at.1))
}

/// Whether more than two neighbours share the exact colour of the pixel
fn has_many_siblings(img: &RgbaImage, x: u32, y: u32) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(img, x, y);
    let center = img.get_pixel(x, y);

    let mut zeroes = u32::from(x == x0 || x == x2 || y == y0 || y == y2);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            if img.get_pixel(nx, ny) == center {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
