//! Parameter types for the raster pipeline.
//!
//! ## Types
//!
//! - [`Quality`]: Encoder quality on the canvas scale (0.0–1.0). Conversions
//!   always use [`Quality::MAX`]; lossless encoders ignore it.
//! - [`EncodeParams`]: Target format + quality for one encode request.
//! - [`Surface`]: Offscreen RGBA drawing surface the bitmap is painted onto.

use crate::format::TargetFormat;
use image::{DynamicImage, RgbaImage};

/// Encoder quality, `0.0..=1.0`. Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub const MAX: Quality = Quality(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MAX;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Map to the 1–100 scale used by the JPEG encoder.
    pub fn as_percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).max(1)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

/// One encode request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub target: TargetFormat,
    pub quality: Quality,
}

impl EncodeParams {
    pub fn max_quality(target: TargetFormat) -> Self {
        Self {
            target,
            quality: Quality::MAX,
        }
    }
}

/// Offscreen drawing surface, sized exactly to the bitmap painted onto it.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Paint `bitmap` at the origin, full size. Pixels outside the surface
    /// are dropped; nothing is scaled.
    pub fn paint(&mut self, bitmap: &DynamicImage) {
        image::imageops::replace(&mut self.pixels, &bitmap.to_rgba8(), 0, 0);
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
