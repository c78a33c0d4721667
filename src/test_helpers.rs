//! Shared test utilities for the image-converter test suite.
//!
//! Fixtures are generated in memory with the `image` crate rather than read
//! from disk, so every test gets exact, known pixel content.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = solid_png(100, 100, [255, 0, 0, 255]);
//! let selection = png_selection(8, 8);
//! ```

use crate::format::TargetFormat;
use crate::session::SourceSelection;
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Pixel fixtures
// =========================================================================

pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// Varied pattern, so lossy round trips are visibly different from lossless.
pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            ((x * 5 + y * 3) % 256) as u8,
            ((x * 7 + y * 11) % 256) as u8,
            ((x * 13 + y * 17) % 256) as u8,
            255,
        ])
    }))
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode `image` as `target` with the `image` crate's default settings.
pub fn encode_fixture(image: &DynamicImage, target: TargetFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    let image = match target {
        // The JPEG encoder rejects alpha.
        TargetFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };
    image
        .write_to(&mut Cursor::new(&mut bytes), target.image_format())
        .unwrap_or_else(|e| panic!("encode {target} fixture: {e}"));
    bytes
}

pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_fixture(&solid_rgba(width, height, color), TargetFormat::Png)
}

/// A PNG selection as a file picker would report it.
pub fn png_selection(width: u32, height: u32) -> SourceSelection {
    SourceSelection::new(
        solid_png(width, height, [40, 80, 120, 255]),
        Some("image/png".into()),
        "fixture.png",
    )
}
