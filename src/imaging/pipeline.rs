//! High-level conversion steps.
//!
//! These functions combine the backend, the HEIC decoder and bounded waits.
//! The order inside [`run_pipeline`] is fixed:
//!
//! 1. load the bytes into a bitmap (bounded wait)
//! 2. acquire a surface of exactly the bitmap's size
//! 3. paint the bitmap at (0, 0), full size
//! 4. encode the surface at maximum quality

use super::backend::{BackendError, RasterBackend};
use super::heic::HeicDecoder;
use super::params::EncodeParams;
use super::wait::{DecodeWorker, WaitOutcome, WaitPolicy, wait_bounded};
use crate::error::ConvertError;
use crate::format::TargetFormat;
use std::sync::Arc;

/// Encoded output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub target: TargetFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Map a finished wait on a decode job into the conversion error taxonomy.
fn settle<T>(
    outcome: WaitOutcome<T, BackendError>,
    policy: &WaitPolicy,
    on_failure: impl FnOnce(BackendError) -> ConvertError,
) -> Result<T, ConvertError> {
    match outcome {
        WaitOutcome::Ready(value) => Ok(value),
        WaitOutcome::Failed(err) => Err(on_failure(err)),
        WaitOutcome::TimedOut => Err(ConvertError::DecodeTimeout(policy.timeout.as_millis())),
        WaitOutcome::Cancelled => Err(ConvertError::Cancelled),
        WaitOutcome::Busy => Err(ConvertError::DecoderBusy),
        WaitOutcome::Crashed => Err(on_failure(BackendError::Decode(
            "decoder stopped without a result".into(),
        ))),
    }
}

/// Run the HEIC decoder under `policy`, producing bytes in `target` format.
///
/// Decoder failures come back as [`ConvertError::HeicDecode`].
pub fn decode_heic(
    decoder: &Arc<dyn HeicDecoder>,
    bytes: &Arc<[u8]>,
    target: TargetFormat,
    policy: &WaitPolicy,
    worker: &mut DecodeWorker,
) -> Result<Vec<u8>, ConvertError> {
    let decoder = Arc::clone(decoder);
    let bytes = Arc::clone(bytes);
    let outcome = wait_bounded(policy, worker, move || decoder.decode(&bytes, target));
    settle(outcome, policy, ConvertError::HeicDecode)
}

/// Re-encode `bytes` as `target` without scaling or cropping.
pub fn run_pipeline(
    backend: &Arc<dyn RasterBackend>,
    bytes: Arc<[u8]>,
    target: TargetFormat,
    policy: &WaitPolicy,
    worker: &mut DecodeWorker,
) -> Result<EncodedImage, ConvertError> {
    let loader = Arc::clone(backend);
    let outcome = wait_bounded(policy, worker, move || loader.load_bitmap(&bytes));
    let bitmap = settle(outcome, policy, |err| {
        ConvertError::InvalidImageData(err.to_string())
    })?;

    let (width, height) = (bitmap.width(), bitmap.height());
    let mut surface = backend
        .acquire_surface(width, height)
        .map_err(|err| ConvertError::RenderingContextUnavailable(err.to_string()))?;
    surface.paint(&bitmap);

    let encoded = backend
        .encode(&surface, EncodeParams::max_quality(target))
        .map_err(|err| ConvertError::Encode(err.to_string()))?;

    log::debug!(
        "encoded {width}x{height} bitmap as {} ({} bytes)",
        target.label(),
        encoded.len()
    );
    Ok(EncodedImage {
        target,
        bytes: encoded,
        width,
        height,
    })
}
