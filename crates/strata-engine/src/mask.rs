//! Masking algorithms: pure per-strip pixel transforms.
//!
//! Each algorithm maps a source region and a [`MaskConfig`] to a newly
//! allocated region of the same dimensions, never mutating its input.
//! [`MaskKind`] is the closed set of available algorithms, selected by
//! value at runtime (via the [`registry`](crate::registry) or directly).
//!
//! Threshold comparisons are strictly-greater-than throughout: a pixel
//! whose RGB mean equals the threshold falls into the "below" branch.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::pixel;
use crate::types::{MaskConfig, MaskError};

/// Fixed fill emitted by the threshold-recolor algorithm in debug mode.
const DEBUG_FILL: Rgba<u8> = Rgba([255, 175, 175, 255]);

/// Selects which masking algorithm to apply.
///
/// A closed sum type rather than a function pointer, so the set of
/// algorithms is known at compile time and per-variant metadata such as
/// [`uses_threshold`](Self::uses_threshold) is derived from the tag
/// instead of mutated into the config as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskKind {
    /// Grayscale edge map: each pixel's neighbor difference, boosted and
    /// written to all four channels, so opacity also encodes edge strength.
    Contrast,

    /// Binary brightness partition: white with zero alpha above the
    /// threshold, opaque black below.
    PixelStrength,

    /// Composite of [`PixelStrength`](Self::PixelStrength) averaged back
    /// onto the source image.
    #[default]
    ContrastColor,

    /// Keep the red channel and alpha, zero green and blue.
    Red,

    /// Keep the green channel and alpha, zero red and blue.
    Green,

    /// Keep the blue channel and alpha, zero red and green.
    Blue,

    /// Average of the red and green single-channel masks.
    RedGreen,

    /// Average of the green and blue single-channel masks.
    GreenBlue,

    /// Average of the red and blue single-channel masks.
    RedBlue,

    /// Replace each pixel with `palette[0]` (above threshold) or
    /// `palette[1]` (below), reapplying the pixel's original alpha.
    ThresholdRecolor,
}

impl MaskKind {
    /// Every algorithm, in registry cycling order.
    pub const ALL: [Self; 10] = [
        Self::Contrast,
        Self::PixelStrength,
        Self::ContrastColor,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::RedGreen,
        Self::GreenBlue,
        Self::RedBlue,
        Self::ThresholdRecolor,
    ];

    /// Whether this algorithm reads `config.threshold`.
    ///
    /// Advisory metadata for UI layers (show or hide a threshold slider);
    /// not a contract of the pixel math itself.
    #[must_use]
    pub const fn uses_threshold(self) -> bool {
        matches!(
            self,
            Self::PixelStrength | Self::ContrastColor | Self::ThresholdRecolor
        )
    }

    /// Check that `config` satisfies this algorithm's preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::InvalidConfig`] if the threshold-recolor
    /// palette has fewer than two entries.
    pub fn validate(self, config: &MaskConfig) -> Result<(), MaskError> {
        match self {
            Self::ThresholdRecolor => palette_pair(config).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Apply this algorithm to `region`, producing a new raster of the
    /// same dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::InvalidConfig`] if [`validate`](Self::validate)
    /// rejects `config`.
    pub fn apply(self, region: &RgbaImage, config: &MaskConfig) -> Result<RgbaImage, MaskError> {
        self.validate(config)?;
        Ok(match self {
            Self::Contrast => contrast(region),
            Self::PixelStrength => pixel_strength(region, config),
            Self::ContrastColor => contrast_color(region, config),
            Self::Red => channel_mask(region, Channel::Red),
            Self::Green => channel_mask(region, Channel::Green),
            Self::Blue => channel_mask(region, Channel::Blue),
            Self::RedGreen => pixel::average_rasters(
                &channel_mask(region, Channel::Green),
                &channel_mask(region, Channel::Red),
            ),
            Self::GreenBlue => pixel::average_rasters(
                &channel_mask(region, Channel::Green),
                &channel_mask(region, Channel::Blue),
            ),
            Self::RedBlue => pixel::average_rasters(
                &channel_mask(region, Channel::Blue),
                &channel_mask(region, Channel::Red),
            ),
            Self::ThresholdRecolor => threshold_recolor(region, config)?,
        })
    }
}

/// Extract the above/below recolor pair from the palette.
fn palette_pair(config: &MaskConfig) -> Result<(Rgba<u8>, Rgba<u8>), MaskError> {
    match config.palette.as_slice() {
        [above, below, ..] => Ok((*above, *below)),
        short => Err(MaskError::InvalidConfig(format!(
            "threshold recolor needs at least 2 palette colors, got {}",
            short.len(),
        ))),
    }
}

/// Integer RGB mean (truncating division by 3) for threshold comparison.
#[allow(clippy::cast_precision_loss)]
fn rgb_mean(color: Rgba<u8>) -> f32 {
    ((u32::from(color[0]) + u32::from(color[1]) + u32::from(color[2])) / 3) as f32
}

/// Grayscale edge map from per-pixel neighbor differences.
///
/// The neighbor difference is truncated to an integer, then multiplied by
/// the truncated boost factor of that same integer. The truncation order
/// is load-bearing: boosting before truncating yields different output.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn contrast(img: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let difference = pixel::neighbor_difference(img, x, y) as u32;
        let boosted = difference * pixel::intensity_boost(difference as f32) as u32;
        let value = boosted.min(255) as u8;
        Rgba([value, value, value, value])
    })
}

/// Binary brightness partition against `config.threshold`.
fn pixel_strength(img: &RgbaImage, config: &MaskConfig) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        if rgb_mean(*img.get_pixel(x, y)) > config.threshold {
            Rgba([255, 255, 255, 0])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// The pixel-strength partition averaged back onto the source image.
fn contrast_color(img: &RgbaImage, config: &MaskConfig) -> RgbaImage {
    pixel::average_rasters(&pixel_strength(img, config), img)
}

/// Which color channel a single-channel mask preserves.
#[derive(Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

/// Keep one color channel and the original alpha, zero the other two.
fn channel_mask(img: &RgbaImage, keep: Channel) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let px = img.get_pixel(x, y);
        match keep {
            Channel::Red => Rgba([px[0], 0, 0, px[3]]),
            Channel::Green => Rgba([0, px[1], 0, px[3]]),
            Channel::Blue => Rgba([0, 0, px[2], px[3]]),
        }
    })
}

/// Two-color recolor by thresholded brightness, preserving per-pixel alpha.
fn threshold_recolor(img: &RgbaImage, config: &MaskConfig) -> Result<RgbaImage, MaskError> {
    if config.debug {
        return Ok(RgbaImage::from_pixel(img.width(), img.height(), DEBUG_FILL));
    }

    let (above, below) = palette_pair(config)?;
    Ok(RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let px = img.get_pixel(x, y);
        let replacement = if rgb_mean(*px) > config.threshold {
            above
        } else {
            below
        };
        pixel::with_alpha(replacement, px[3])
    }))
}
