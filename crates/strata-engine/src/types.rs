//! Shared types for the strata masking engine.

use serde::{Deserialize, Serialize};

/// Re-export `Rgba` and `RgbaImage` so downstream crates can reference
/// raster data without depending on `image` directly.
pub use image::{Rgba, RgbaImage};

/// Runtime parameters shaping a masking algorithm's behavior.
///
/// The config is shared read-only by every strip worker of a masking
/// call; algorithms never mutate it. Whether the active algorithm
/// actually consults `threshold` is a property of the algorithm itself
/// — see [`MaskKind::uses_threshold`](crate::mask::MaskKind::uses_threshold).
///
/// # Threshold bounds
///
/// `threshold_min <= threshold <= threshold_max` is a recommendation for
/// UI sliders, not an enforced invariant. Inconsistent values change the
/// output but never cause a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskConfig {
    /// Brightness cutoff for threshold-driven algorithms (0–255 scale).
    pub threshold: f32,

    /// Lower bound hint for UI threshold controls.
    pub threshold_min: f32,

    /// Upper bound hint for UI threshold controls.
    pub threshold_max: f32,

    /// Paint every pixel with a fixed debug color instead of masking.
    /// Only honored by the threshold-recolor algorithm.
    pub debug: bool,

    /// Recolor palette in insertion order. Index 0 paints above-threshold
    /// pixels, index 1 the rest. The threshold-recolor algorithm requires
    /// at least two entries.
    pub palette: Vec<Rgba<u8>>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            threshold_min: 0.0,
            threshold_max: 255.0,
            debug: false,
            palette: Vec::new(),
        }
    }
}

/// Serde-compatible proxy for `MaskConfig`.
///
/// Palette colors are represented as `[u8; 4]` arrays since
/// `image::Rgba` does not implement serde traits.
#[derive(Serialize, Deserialize)]
struct MaskConfigProxy {
    threshold: f32,
    threshold_min: f32,
    threshold_max: f32,
    debug: bool,
    palette: Vec<[u8; 4]>,
}

impl Serialize for MaskConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = MaskConfigProxy {
            threshold: self.threshold,
            threshold_min: self.threshold_min,
            threshold_max: self.threshold_max,
            debug: self.debug,
            palette: self.palette.iter().map(|c| c.0).collect(),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MaskConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = MaskConfigProxy::deserialize(deserializer)?;
        Ok(Self {
            threshold: proxy.threshold,
            threshold_min: proxy.threshold_min,
            threshold_max: proxy.threshold_max,
            debug: proxy.debug,
            palette: proxy.palette.into_iter().map(Rgba).collect(),
        })
    }
}

/// Errors that can occur while masking an image.
///
/// A caller receives either a fully assembled output raster or one of
/// these — never a partially stitched image.
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    /// The configuration is unusable for the selected algorithm.
    #[error("invalid mask configuration: {0}")]
    InvalidConfig(String),

    /// An algorithm invocation failed while processing the identified strip.
    #[error("strip worker at y={y_offset} (height {height}) failed: {source}")]
    Worker {
        /// Vertical offset of the failing strip in the source raster.
        y_offset: u32,
        /// Height of the failing strip in rows.
        height: u32,
        /// The underlying algorithm failure.
        source: Box<MaskError>,
    },

    /// A strip worker panicked. The panic is caught at the join barrier
    /// and reported instead of unwinding through the engine.
    #[error("strip worker at y={y_offset} (height {height}) panicked: {message}")]
    WorkerPanic {
        /// Vertical offset of the panicking strip in the source raster.
        y_offset: u32,
        /// Height of the panicking strip in rows.
        height: u32,
        /// Panic payload, when it carried a message.
        message: String,
    },
}
