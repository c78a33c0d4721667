//! Pure Rust raster backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Load (PNG, JPEG, WebP) | `ImageReader::with_guessed_format` (magic bytes) |
//! | Surface | `image::RgbaImage` sized to the bitmap |
//! | Encode → PNG | `PngEncoder` (lossless) |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, alpha flattened onto black |
//! | Encode → WebP | `WebPEncoder::new_lossless` (quality ignored) |

use super::backend::{BackendError, RasterBackend};
use super::params::{EncodeParams, Surface};
use crate::format::TargetFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use std::io::Cursor;

/// Largest surface handed out by default (100 megapixels).
pub const DEFAULT_MAX_SURFACE_PIXELS: u64 = 100_000_000;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    max_surface_pixels: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_max_surface_pixels(DEFAULT_MAX_SURFACE_PIXELS)
    }

    pub fn with_max_surface_pixels(max_surface_pixels: u64) -> Self {
        Self { max_surface_pixels }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop alpha by compositing onto opaque black, as a canvas JPEG export does.
fn flatten_onto_black(surface: &Surface) -> RgbImage {
    let rgba = surface.pixels();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

impl RasterBackend for RustBackend {
    fn load_bitmap(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        if bytes.is_empty() {
            return Err(BackendError::Decode("input is empty".into()));
        }
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn acquire_surface(&self, width: u32, height: u32) -> Result<Surface, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::SurfaceUnavailable(format!(
                "zero-sized surface {width}x{height}"
            )));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_surface_pixels {
            return Err(BackendError::SurfaceUnavailable(format!(
                "{width}x{height} exceeds the {} pixel limit",
                self.max_surface_pixels
            )));
        }
        Ok(Surface::blank(width, height))
    }

    fn encode(&self, surface: &Surface, params: EncodeParams) -> Result<Vec<u8>, BackendError> {
        let mut buffer = Vec::new();
        let (width, height) = (surface.width(), surface.height());
        let result = match params.target {
            TargetFormat::Png => PngEncoder::new(Cursor::new(&mut buffer)).write_image(
                surface.pixels().as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            TargetFormat::Jpeg => {
                let rgb = flatten_onto_black(surface);
                JpegEncoder::new_with_quality(
                    Cursor::new(&mut buffer),
                    params.quality.as_percent(),
                )
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
            TargetFormat::Webp => WebPEncoder::new_lossless(Cursor::new(&mut buffer))
                .write_image(
                    surface.pixels().as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                ),
        };
        result.map_err(|e| {
            BackendError::Encode(format!("{} encode failed: {e}", params.target.label()))
        })?;
        Ok(buffer)
    }
}
