//! Per-pixel arithmetic shared by the masking algorithms.
//!
//! Everything in this module is pure and deterministic: colors in,
//! colors out, no shared state. The masking algorithms in
//! [`crate::mask`] are thin per-pixel loops over these helpers.

use image::{Rgba, RgbaImage};

/// Mean absolute per-channel difference between two colors, alpha included.
///
/// Ranges over `0.0..=255.0`.
#[must_use]
pub fn channel_difference(a: Rgba<u8>, b: Rgba<u8>) -> f32 {
    let diff = |i: usize| f32::from(a[i].abs_diff(b[i]));
    (diff(0) + diff(1) + diff(2) + diff(3)) / 4.0
}

/// Average [`channel_difference`] between the pixel at `(x, y)` and each of
/// its existing axis-aligned neighbors.
///
/// Edge and corner pixels average over fewer neighbors. A 1x1 raster has
/// no neighbors at all and yields `0.0`.
///
/// `(x, y)` must be in bounds of `img`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn neighbor_difference(img: &RgbaImage, x: u32, y: u32) -> f32 {
    let center = *img.get_pixel(x, y);
    let mut total = 0.0;
    let mut neighbors = 0u32;

    if x > 0 {
        total += channel_difference(center, *img.get_pixel(x - 1, y));
        neighbors += 1;
    }
    if x + 1 < img.width() {
        total += channel_difference(center, *img.get_pixel(x + 1, y));
        neighbors += 1;
    }
    if y > 0 {
        total += channel_difference(center, *img.get_pixel(x, y - 1));
        neighbors += 1;
    }
    if y + 1 < img.height() {
        total += channel_difference(center, *img.get_pixel(x, y + 1));
        neighbors += 1;
    }

    if neighbors == 0 {
        // 1x1 raster: no neighbors to compare against.
        return 0.0;
    }
    total / neighbors as f32
}

/// Contrast boost curve: `exp(-x) + 1`.
///
/// Monotonically decreasing from 2 toward 1, so small differences are
/// amplified more than large ones.
#[must_use]
pub fn intensity_boost(x: f32) -> f32 {
    (-x).exp() + 1.0
}

/// Per-channel arithmetic mean across all supplied colors.
///
/// When `keep_alpha` is false the output alpha is forced to fully opaque
/// regardless of the inputs. Channel sums accumulate as `f32` and
/// truncate back to `u8`. An empty slice yields the fully transparent
/// zero color.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn average_colors(keep_alpha: bool, colors: &[Rgba<u8>]) -> Rgba<u8> {
    if colors.is_empty() {
        return Rgba([0, 0, 0, 0]);
    }

    let mut sums = [0.0f32; 4];
    for color in colors {
        for (sum, &channel) in sums.iter_mut().zip(color.0.iter()) {
            *sum += f32::from(channel);
        }
    }

    let count = colors.len() as f32;
    let mut out = sums.map(|sum| (sum / count) as u8);
    if !keep_alpha {
        out[3] = 255;
    }
    Rgba(out)
}

/// Average two rasters pixel-by-pixel.
///
/// The output is sized to the component-wise maximum of the two inputs.
/// Where both rasters cover a coordinate their colors are averaged with
/// alpha forced opaque; where only one covers it, its pixel is copied
/// unchanged; where neither does, the default transparent pixel remains.
#[must_use = "returns the averaged raster"]
pub fn average_rasters(a: &RgbaImage, b: &RgbaImage) -> RgbaImage {
    let width = a.width().max(b.width());
    let height = a.height().max(b.height());
    let mut out = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let in_a = in_bounds(a, i64::from(x), i64::from(y));
            let in_b = in_bounds(b, i64::from(x), i64::from(y));
            let pixel = match (in_a, in_b) {
                (true, true) => average_colors(false, &[*a.get_pixel(x, y), *b.get_pixel(x, y)]),
                (true, false) => *a.get_pixel(x, y),
                (false, true) => *b.get_pixel(x, y),
                (false, false) => continue,
            };
            out.put_pixel(x, y, pixel);
        }
    }

    out
}

/// Channel-wise complement of the color channels; alpha is untouched.
#[must_use]
pub const fn invert(color: Rgba<u8>) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = color;
    Rgba([255 - r, 255 - g, 255 - b, a])
}

/// The same color with its alpha channel replaced.
#[must_use]
pub const fn with_alpha(color: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let Rgba([r, g, b, _]) = color;
    Rgba([r, g, b, alpha])
}

/// Whether `(x, y)` addresses a pixel of `img`.
///
/// Signed inputs so callers can probe coordinates produced by offset
/// arithmetic without wrapping.
#[must_use]
pub fn in_bounds(img: &RgbaImage, x: i64, y: i64) -> bool {
    x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height())
}
