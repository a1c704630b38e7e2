//! The concurrent masking engine: partition, dispatch, join, stitch.
//!
//! One masking call is a one-shot fork/join. The source raster is split
//! into contiguous horizontal strips, one scoped worker thread masks each
//! strip against a read-only view of the source, the scope exit is a full
//! join barrier, and the per-strip results are stitched back into a
//! single output raster. No worker ever writes memory another worker
//! reads; the only shared data during a call is the immutable source and
//! config.

use std::any::Any;

use image::{RgbaImage, imageops};

use crate::mask::MaskKind;
use crate::types::{MaskConfig, MaskError};

/// Upper bound on strips (and worker threads) per masking call.
pub const MAX_STRIPS: u32 = 2048;

/// A contiguous horizontal slice of the source raster, the unit of
/// parallel work. Strips span the full raster width at x = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    /// Vertical offset of the strip's first row in the source raster.
    pub y_offset: u32,
    /// Number of rows in the strip.
    pub height: u32,
}

/// Split `height` rows into at most [`MAX_STRIPS`] contiguous strips.
///
/// The nominal strip height is `height / strip_count` (integer division);
/// the final strip absorbs the remainder, so strip heights always sum to
/// exactly `height` and consecutive strips neither overlap nor leave gaps.
/// Zero height yields no strips.
#[must_use]
pub fn partition(height: u32) -> Vec<Strip> {
    if height == 0 {
        return Vec::new();
    }

    let count = height.min(MAX_STRIPS);
    let strip_height = height / count;

    (0..count)
        .map(|i| {
            let y_offset = i * strip_height;
            let rows = if i + 1 == count {
                // Last strip takes whatever rows are left.
                height - y_offset
            } else {
                strip_height
            };
            Strip {
                y_offset,
                height: rows,
            }
        })
        .collect()
}

/// Mask `source` with `kind`, one worker thread per strip.
///
/// Blocks until every strip has been processed, then returns a newly
/// allocated raster of the same dimensions as the source. The source is
/// never mutated.
///
/// A zero-area source short-circuits to an equally sized empty raster.
///
/// # Errors
///
/// Returns [`MaskError::InvalidConfig`] if `config` fails the selected
/// algorithm's preconditions (checked before any thread is spawned).
/// Returns [`MaskError::Worker`] or [`MaskError::WorkerPanic`] naming
/// the first failing strip in top-to-bottom order; all other workers are
/// allowed to finish first, and no partial output is ever returned.
pub fn mask_with(
    kind: MaskKind,
    source: &RgbaImage,
    config: &MaskConfig,
) -> Result<RgbaImage, MaskError> {
    if source.width() == 0 || source.height() == 0 {
        return Ok(RgbaImage::new(source.width(), source.height()));
    }

    kind.validate(config)?;

    let strips = partition(source.height());

    // Fan out one scoped worker per strip. The scope exit is the join
    // barrier: every worker has finished before results are inspected.
    let results: Vec<(Strip, Result<RgbaImage, MaskError>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = strips
            .iter()
            .map(|&strip| {
                let handle = scope.spawn(move || {
                    let region =
                        imageops::crop_imm(source, 0, strip.y_offset, source.width(), strip.height)
                            .to_image();
                    kind.apply(&region, config)
                });
                (strip, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(strip, handle)| {
                let result = match handle.join() {
                    Ok(masked) => masked.map_err(|cause| MaskError::Worker {
                        y_offset: strip.y_offset,
                        height: strip.height,
                        source: Box::new(cause),
                    }),
                    Err(payload) => Err(MaskError::WorkerPanic {
                        y_offset: strip.y_offset,
                        height: strip.height,
                        message: panic_message(payload.as_ref()),
                    }),
                };
                (strip, result)
            })
            .collect()
    });

    // Surface the first failure (in strip order) before touching the
    // output, so a caller never sees a partially stitched raster.
    let mut masked_strips = Vec::with_capacity(results.len());
    for (strip, result) in results {
        masked_strips.push((strip, result?));
    }

    // Stitch in strip order. Order does not affect pixel values (strips
    // are disjoint) but keeps the copy sequence deterministic.
    let mut output = RgbaImage::new(source.width(), source.height());
    for (strip, masked) in masked_strips {
        imageops::replace(&mut output, &masked, 0, i64::from(strip.y_offset));
    }

    Ok(output)
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload.downcast_ref::<&str>().map_or_else(
        || {
            payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "opaque panic payload".to_string())
        },
        ToString::to_string,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn partition_zero_height_yields_no_strips() {
        assert!(partition(0).is_empty());
    }

    #[test]
    fn partition_small_height_is_one_row_per_strip() {
        let strips = partition(5);
        assert_eq!(strips.len(), 5);
        for (i, strip) in strips.iter().enumerate() {
            assert_eq!(strip.y_offset, i as u32);
            assert_eq!(strip.height, 1);
        }
    }

    #[test]
    fn partition_clamps_to_max_strips() {
        let strips = partition(10_000);
        assert_eq!(strips.len(), MAX_STRIPS as usize);
    }

    #[test]
    fn uneven_height_is_fully_covered() {
        // 5000 rows over 2048 strips: nominal height 2, the last strip
        // absorbs the 906-row remainder. No row is lost or duplicated.
        let strips = partition(5000);
        assert_eq!(strips.len(), 2048);
        assert_eq!(strips[0].height, 2);
        assert_eq!(strips.last().unwrap().height, 906);

        let mut expected_offset = 0;
        for strip in &strips {
            assert_eq!(strip.y_offset, expected_offset, "gap or overlap");
            expected_offset += strip.height;
        }
        assert_eq!(expected_offset, 5000);
    }

    #[test]
    fn partition_exact_division_has_uniform_strips() {
        let strips = partition(4096);
        assert_eq!(strips.len(), 2048);
        assert!(strips.iter().all(|s| s.height == 2));
        assert_eq!(strips.iter().map(|s| s.height).sum::<u32>(), 4096);
    }

    #[test]
    fn zero_area_source_returns_empty_raster() {
        let img = RgbaImage::new(0, 0);
        let out = mask_with(MaskKind::Red, &img, &MaskConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (0, 0));

        let img = RgbaImage::new(7, 0);
        let out = mask_with(MaskKind::Red, &img, &MaskConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (7, 0));
    }

    #[test]
    fn output_dimensions_match_source() {
        let img = RgbaImage::from_pixel(13, 21, Rgba([30, 60, 90, 255]));
        let config = MaskConfig {
            threshold: 50.0,
            ..MaskConfig::default()
        };
        for kind in [MaskKind::Contrast, MaskKind::PixelStrength, MaskKind::Blue] {
            let out = mask_with(kind, &img, &config).unwrap();
            assert_eq!(out.dimensions(), img.dimensions(), "{kind:?}");
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_dispatch() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let result = mask_with(MaskKind::ThresholdRecolor, &img, &MaskConfig::default());
        assert!(matches!(result, Err(MaskError::InvalidConfig(_))));
    }

    #[test]
    fn stitched_output_matches_whole_image_apply_for_pointwise_masks() {
        // Per-pixel algorithms are strip-independent, so the parallel
        // engine must reproduce a direct whole-image application exactly.
        let img = RgbaImage::from_fn(9, 33, |x, y| {
            Rgba([(x * 28) as u8, (y * 7) as u8, ((x + y) * 11) as u8, 200])
        });
        let config = MaskConfig {
            threshold: 60.0,
            palette: vec![Rgba([255, 0, 255, 255]), Rgba([0, 255, 0, 255])],
            ..MaskConfig::default()
        };

        for kind in [
            MaskKind::PixelStrength,
            MaskKind::Red,
            MaskKind::GreenBlue,
            MaskKind::ContrastColor,
            MaskKind::ThresholdRecolor,
        ] {
            let parallel = mask_with(kind, &img, &config).unwrap();
            let direct = kind.apply(&img, &config).unwrap();
            assert_eq!(parallel, direct, "{kind:?} diverged from direct apply");
        }
    }

    #[test]
    fn strips_land_at_their_recorded_offsets() {
        // A vertical gradient recolored through the red channel mask:
        // every output row must match its source row, proving strips are
        // stitched at the right offsets in the right order.
        let img = RgbaImage::from_fn(5, 40, |_, y| Rgba([(y * 6) as u8, 99, 99, 255]));
        let out = mask_with(MaskKind::Red, &img, &MaskConfig::default()).unwrap();
        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(
                *pixel,
                Rgba([(y * 6) as u8, 0, 0, 255]),
                "wrong pixel at ({x}, {y})",
            );
        }
    }

    #[test]
    fn source_raster_is_not_mutated() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 40]));
        let before = img.clone();
        let _ = mask_with(MaskKind::ContrastColor, &img, &MaskConfig::default()).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn concurrent_calls_do_not_cross_contaminate() {
        // Two threads mask different uniform rasters with the same
        // algorithm; each output must reflect only its own input.
        let config = MaskConfig {
            threshold: 100.0,
            ..MaskConfig::default()
        };
        let bright = RgbaImage::from_pixel(16, 16, Rgba([250, 250, 250, 255]));
        let dark = RgbaImage::from_pixel(16, 16, Rgba([5, 5, 5, 255]));

        std::thread::scope(|scope| {
            let bright_out =
                scope.spawn(|| mask_with(MaskKind::PixelStrength, &bright, &config).unwrap());
            let dark_out =
                scope.spawn(|| mask_with(MaskKind::PixelStrength, &dark, &config).unwrap());

            let bright_out = bright_out.join().unwrap();
            let dark_out = dark_out.join().unwrap();

            for pixel in bright_out.pixels() {
                assert_eq!(*pixel, Rgba([255, 255, 255, 0]));
            }
            for pixel in dark_out.pixels() {
                assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
            }
        });
    }
}
