//! Apply a strip-parallel masking algorithm to an image file.
//!
//! Decodes the input, runs the selected algorithm through the masking
//! engine, and writes the result. All pixel work happens in
//! `strata-engine`; this binary only handles files and flags.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use strata_engine::{AlgorithmRegistry, MaskConfig, MaskKind, Rgba};

/// Apply a strip-parallel masking algorithm to an image file.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Output image path (PNG recommended).
    #[arg(short, long)]
    output: PathBuf,

    /// Masking algorithm to apply.
    #[arg(short, long, value_enum, default_value = "contrast-color")]
    algorithm: Algorithm,

    /// Cycle the algorithm registry forward N times before masking,
    /// the way a UI's "next algorithm" control would. Overrides
    /// --algorithm when N > 0.
    #[arg(long, value_name = "N", default_value_t = 0)]
    cycle: u32,

    /// Brightness threshold for threshold-driven algorithms (0-255).
    #[arg(short, long, default_value_t = 127.0)]
    threshold: f32,

    /// Recolor palette as comma-separated hex colors (RRGGBB or
    /// RRGGBBAA). The first color paints above-threshold pixels, the
    /// second the rest.
    #[arg(long, value_name = "HEX,HEX", default_value = "ffffff,000000")]
    palette: String,

    /// Paint every pixel with the fixed debug color instead of masking
    /// (threshold-recolor only).
    #[arg(long)]
    debug: bool,
}

/// CLI-facing algorithm names, mapped onto [`MaskKind`].
#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    Contrast,
    PixelStrength,
    ContrastColor,
    Red,
    Green,
    Blue,
    RedGreen,
    GreenBlue,
    RedBlue,
    ThresholdRecolor,
}

impl From<Algorithm> for MaskKind {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Contrast => Self::Contrast,
            Algorithm::PixelStrength => Self::PixelStrength,
            Algorithm::ContrastColor => Self::ContrastColor,
            Algorithm::Red => Self::Red,
            Algorithm::Green => Self::Green,
            Algorithm::Blue => Self::Blue,
            Algorithm::RedGreen => Self::RedGreen,
            Algorithm::GreenBlue => Self::GreenBlue,
            Algorithm::RedBlue => Self::RedBlue,
            Algorithm::ThresholdRecolor => Self::ThresholdRecolor,
        }
    }
}

// ---------------------------------------------------------------------------
// Palette parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated list of hex colors.
fn parse_palette(spec: &str) -> Result<Vec<Rgba<u8>>, String> {
    spec.split(',').map(|c| parse_hex_color(c.trim())).collect()
}

/// Parse a single `RRGGBB` or `RRGGBBAA` hex color, `#` prefix optional.
fn parse_hex_color(spec: &str) -> Result<Rgba<u8>, String> {
    let hex = spec.strip_prefix('#').unwrap_or(spec);
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return Err(format!(
            "expected RRGGBB or RRGGBBAA hex color, got: '{spec}'"
        ));
    }

    let channel = |range: std::ops::Range<usize>| -> Result<u8, String> {
        u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid hex color '{spec}': {e}"))
    };

    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;
    let a = if hex.len() == 8 { channel(6..8)? } else { 255 };
    Ok(Rgba([r, g, b, a]))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Reading image from {}", args.input.display());
    let source = image::open(&args.input)?.to_rgba8();
    let (width, height) = source.dimensions();
    eprintln!("Source: {width}x{height}");

    let palette = parse_palette(&args.palette).map_err(|e| format!("--palette: {e}"))?;
    let config = MaskConfig {
        threshold: args.threshold,
        debug: args.debug,
        palette,
        ..MaskConfig::default()
    };

    let registry = AlgorithmRegistry::with_all();
    registry.set_active(args.algorithm.into());
    for _ in 0..args.cycle {
        registry.advance();
    }

    let active = registry.active();
    if active.uses_threshold() {
        eprintln!("Masking with {active:?} (threshold {})", config.threshold);
    } else {
        eprintln!("Masking with {active:?}");
    }

    let masked = registry.mask_image(&source, &config)?;

    eprintln!("Saving to {}", args.output.display());
    masked.save(&args.output)?;

    eprintln!("Done.");
    Ok(())
}
