//! Conversion error taxonomy.
//!
//! Every failure a session can hit maps to one [`ConvertError`] variant. None
//! of them is fatal to the session: the failed operation leaves the result
//! slot empty and the caller decides how to show the error.

use crate::imaging::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("no image selected")]
    NoSelection,
    #[error("no conversion result to download")]
    NoResult,
    #[error("HEIC preview decode failed: {0}")]
    PreviewDecode(#[source] BackendError),
    #[error("HEIC decode failed: {0}")]
    HeicDecode(#[source] BackendError),
    #[error("rendering context unavailable: {0}")]
    RenderingContextUnavailable(String),
    #[error("invalid image data: {0}")]
    InvalidImageData(String),
    #[error("decode timed out after {0} ms")]
    DecodeTimeout(u128),
    #[error("conversion cancelled")]
    Cancelled,
    #[error("a previous decode is still running")]
    DecoderBusy,
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
