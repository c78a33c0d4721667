//! HEIC decoding.
//!
//! The raster backend cannot read HEIC, so HEIC inputs are first handed to a
//! [`HeicDecoder`], which returns the same picture re-encoded in a standard
//! raster format. The rest of the pipeline never sees HEIC bytes.
//!
//! With the `heic` cargo feature the decoder is [`LibheifDecoder`], backed by
//! the system libheif. Without it, [`UnsupportedHeicDecoder`] fails every
//! decode so HEIC selections degrade to an ordinary decode error.

use super::backend::BackendError;
use crate::format::TargetFormat;
use std::sync::Arc;

/// Preview renderings of HEIC input are always produced in this format.
pub const PREVIEW_FORMAT: TargetFormat = TargetFormat::Png;

/// External HEIC decode library, treated as opaque and untrusted.
pub trait HeicDecoder: Send + Sync {
    /// Decode `bytes` and re-encode the primary image as `target`.
    fn decode(&self, bytes: &[u8], target: TargetFormat) -> Result<Vec<u8>, BackendError>;
}

/// Best decoder compiled into this build.
pub fn default_decoder() -> Arc<dyn HeicDecoder> {
    #[cfg(feature = "heic")]
    {
        Arc::new(LibheifDecoder::new())
    }
    #[cfg(not(feature = "heic"))]
    {
        Arc::new(UnsupportedHeicDecoder)
    }
}

/// Decoder used when the crate is built without the `heic` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedHeicDecoder;

impl HeicDecoder for UnsupportedHeicDecoder {
    fn decode(&self, _bytes: &[u8], _target: TargetFormat) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Decode(
            "HEIC support is not compiled in (rebuild with --features heic)".into(),
        ))
    }
}

#[cfg(feature = "heic")]
pub use libheif::LibheifDecoder;

#[cfg(feature = "heic")]
mod libheif {
    use super::{BackendError, HeicDecoder};
    use crate::format::TargetFormat;
    use crate::imaging::backend::RasterBackend;
    use crate::imaging::params::EncodeParams;
    use crate::imaging::rust_backend::RustBackend;
    use image::{DynamicImage, RgbImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    /// libheif-backed decoder. Output is encoded at maximum quality.
    pub struct LibheifDecoder {
        encoder: RustBackend,
    }

    impl LibheifDecoder {
        pub fn new() -> Self {
            Self {
                encoder: RustBackend::new(),
            }
        }

        fn decode_primary(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            let ctx = HeifContext::read_from_bytes(bytes)
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            let handle = ctx
                .primary_image_handle()
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            let has_alpha = handle.has_alpha_channel();
            let chroma = if has_alpha {
                RgbChroma::Rgba
            } else {
                RgbChroma::Rgb
            };
            let decoded = LibHeif::new()
                .decode(&handle, ColorSpace::Rgb(chroma), None)
                .map_err(|e| BackendError::Decode(e.to_string()))?;

            let planes = decoded.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| BackendError::Decode("no interleaved plane".into()))?;
            let (width, height) = (plane.width, plane.height);
            let channels = if has_alpha { 4 } else { 3 };
            let row_len = width as usize * channels;

            let mut packed = Vec::with_capacity(row_len * height as usize);
            for row in plane.data.chunks(plane.stride).take(height as usize) {
                let row = row
                    .get(..row_len)
                    .ok_or_else(|| BackendError::Decode("truncated HEIC plane".into()))?;
                packed.extend_from_slice(row);
            }

            let image = if has_alpha {
                RgbaImage::from_raw(width, height, packed).map(DynamicImage::ImageRgba8)
            } else {
                RgbImage::from_raw(width, height, packed).map(DynamicImage::ImageRgb8)
            };
            image.ok_or_else(|| BackendError::Decode("HEIC plane size mismatch".into()))
        }
    }

    impl Default for LibheifDecoder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HeicDecoder for LibheifDecoder {
        fn decode(&self, bytes: &[u8], target: TargetFormat) -> Result<Vec<u8>, BackendError> {
            let bitmap = self.decode_primary(bytes)?;
            let mut surface = self
                .encoder
                .acquire_surface(bitmap.width(), bitmap.height())?;
            surface.paint(&bitmap);
            self.encoder
                .encode(&surface, EncodeParams::max_quality(target))
        }
    }

}
