//! Image decoding and re-encoding, pure Rust except for optional libheif.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **HEIC decode** | `libheif-rs` (feature `heic`) |
//! | **Bitmap load** | `image::ImageReader` with magic-byte detection |
//! | **Surface + paint** | `image::RgbaImage` + `imageops::replace` |
//! | **Encode** | `image` PNG / JPEG / lossless WebP encoders |
//!
//! The module is split into:
//! - **Parameters**: [`Quality`], [`EncodeParams`], [`Surface`]
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **HEIC**: [`HeicDecoder`] trait + libheif / unsupported implementations
//! - **Wait**: bounded, cancellable waits around untrusted decodes, one
//!   worker thread at a time
//! - **Pipeline**: high-level functions combining the pieces above

pub mod backend;
pub mod heic;
mod params;
pub mod pipeline;
pub mod rust_backend;
pub mod wait;

pub use backend::{BackendError, Dimensions, RasterBackend};
#[cfg(feature = "heic")]
pub use heic::LibheifDecoder;
pub use heic::{HeicDecoder, PREVIEW_FORMAT, UnsupportedHeicDecoder, default_decoder};
pub use params::{EncodeParams, Quality, Surface};
pub use pipeline::{EncodedImage, decode_heic, run_pipeline};
pub use rust_backend::{DEFAULT_MAX_SURFACE_PIXELS, RustBackend};
pub use wait::{
    CancelToken, DEFAULT_DECODE_TIMEOUT, DecodeWorker, WaitOutcome, WaitPolicy, wait_bounded,
};
