//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait is the platform raster codec: it loads encoded
//! bytes into a bitmap, hands out offscreen surfaces, and encodes a painted
//! surface into a target format.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure-Rust
//! `image` crate.

use super::params::{EncodeParams, Surface};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster codecs.
///
/// `Send + Sync` because bitmap loads run on a worker thread so the caller
/// can bound the wait.
pub trait RasterBackend: Send + Sync {
    /// Decode encoded bytes into an in-memory bitmap.
    fn load_bitmap(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Allocate a blank surface of exactly `width` × `height` pixels.
    fn acquire_surface(&self, width: u32, height: u32) -> Result<Surface, BackendError>;

    /// Encode the surface's pixels.
    fn encode(&self, surface: &Surface, params: EncodeParams) -> Result<Vec<u8>, BackendError>;
}
