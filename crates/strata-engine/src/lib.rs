//! strata-engine: pluggable parallel image masking (sans-IO).
//!
//! Masks an in-memory RGBA raster by splitting it into contiguous
//! horizontal strips, applying the selected algorithm to every strip
//! concurrently, and stitching the results back into a single output:
//! select algorithm -> partition -> parallel mask -> join -> stitch.
//!
//! This crate has **no I/O dependencies** -- it operates on decoded
//! in-memory rasters and returns a new raster or an error. Decoding,
//! encoding, and all user interaction live with the caller.
//!
//! # Entry points
//!
//! The engine exposes exactly two surfaces:
//!
//! - [`AlgorithmRegistry`]: register algorithms, cycle through them, and
//!   mask with whichever is active via
//!   [`mask_image`](AlgorithmRegistry::mask_image).
//! - [`mask_with`]: mask with an explicitly chosen [`MaskKind`],
//!   bypassing the registry.
//!
//! ```rust
//! use strata_engine::{AlgorithmRegistry, MaskConfig, MaskKind, Rgba, RgbaImage};
//!
//! # fn run() -> Result<(), strata_engine::MaskError> {
//! let registry = AlgorithmRegistry::with_all();
//! registry.set_active(MaskKind::PixelStrength);
//!
//! let source = RgbaImage::from_pixel(64, 64, Rgba([180, 90, 45, 255]));
//! let config = MaskConfig {
//!     threshold: 100.0,
//!     ..MaskConfig::default()
//! };
//! let masked = registry.mask_image(&source, &config)?;
//! assert_eq!(masked.dimensions(), source.dimensions());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod mask;
pub mod pixel;
pub mod registry;
pub mod types;

pub use engine::{MAX_STRIPS, Strip, mask_with, partition};
pub use mask::MaskKind;
pub use registry::AlgorithmRegistry;
pub use types::{MaskConfig, MaskError, Rgba, RgbaImage};
