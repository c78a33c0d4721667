//! Conversion session: the one selection, preview and result the converter
//! works with at any time.
//!
//! ## Lifecycle
//!
//! ```text
//! select ──► (HEIC? decode preview) ──► convert ──► download
//!   ▲                                      │
//!   └──────────── clear / select ◄─────────┘
//! ```
//!
//! Every mutating operation takes `&mut self`, so only one of them can be in
//! flight. Selecting a new source releases the previous result and preview
//! *before* anything else happens, so a result is never shown next to a
//! source it was not produced from.
//!
//! Failures never poison the session. A failed preview leaves the preview
//! unset; a failed conversion leaves the result slot empty. Both are logged,
//! kept as [`Session::last_error`], and returned to the caller.

use crate::error::ConvertError;
use crate::format::{TargetFormat, is_heic, sniff_mime};
use crate::imaging::{
    CancelToken, DEFAULT_DECODE_TIMEOUT, DEFAULT_MAX_SURFACE_PIXELS, DecodeWorker, HeicDecoder,
    PREVIEW_FORMAT, RasterBackend, RustBackend, WaitPolicy, decode_heic, default_decoder,
    run_pipeline,
};
use crate::package::{ConversionResult, DownloadSink, size_from_data_uri};
use crate::resources::{Resource, ResourceHandle, ResourceStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// The user's chosen input.
#[derive(Debug, Clone)]
pub struct SourceSelection {
    pub bytes: Arc<[u8]>,
    /// MIME type reported alongside the file, if any.
    pub declared_mime: Option<String>,
    pub file_name: String,
    pub len: usize,
}

impl SourceSelection {
    pub fn new(bytes: Vec<u8>, declared_mime: Option<String>, file_name: impl Into<String>) -> Self {
        let len = bytes.len();
        Self {
            bytes: Arc::from(bytes),
            declared_mime,
            file_name: file_name.into(),
            len,
        }
    }

    /// Read a file from disk, sniffing its MIME type from the content.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let bytes = std::fs::read(path)?;
        let declared_mime = sniff_mime(&bytes).map(str::to_string);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(bytes, declared_mime, file_name))
    }

    pub fn is_heic(&self) -> bool {
        is_heic(self.declared_mime.as_deref(), &self.file_name)
    }
}

/// Outcome of building the preview after a selection.
#[derive(Debug)]
pub enum PreviewStatus {
    Ready(ResourceHandle),
    Unavailable(ConvertError),
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub default_target: TargetFormat,
    pub decode_timeout: Duration,
    pub max_surface_pixels: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_target: TargetFormat::default(),
            decode_timeout: DEFAULT_DECODE_TIMEOUT,
            max_surface_pixels: DEFAULT_MAX_SURFACE_PIXELS,
        }
    }
}

pub struct Session {
    backend: Arc<dyn RasterBackend>,
    decoder: Arc<dyn HeicDecoder>,
    options: SessionOptions,
    resources: ResourceStore,
    worker: DecodeWorker,
    target: TargetFormat,
    selection: Option<SourceSelection>,
    preview: Option<ResourceHandle>,
    result: Option<ConversionResult>,
    last_error: Option<String>,
}

impl Session {
    /// Session using the `image` crate backend and the compiled-in HEIC decoder.
    pub fn new(options: SessionOptions) -> Self {
        let backend = Arc::new(RustBackend::with_max_surface_pixels(
            options.max_surface_pixels,
        ));
        Self::with_parts(backend, default_decoder(), options)
    }

    pub fn with_parts(
        backend: Arc<dyn RasterBackend>,
        decoder: Arc<dyn HeicDecoder>,
        options: SessionOptions,
    ) -> Self {
        Self {
            backend,
            decoder,
            target: options.default_target,
            options,
            resources: ResourceStore::new(),
            worker: DecodeWorker::new(),
            selection: None,
            preview: None,
            result: None,
            last_error: None,
        }
    }

    pub fn selection(&self) -> Option<&SourceSelection> {
        self.selection.as_ref()
    }

    pub fn target(&self) -> TargetFormat {
        self.target
    }

    pub fn set_target(&mut self, target: TargetFormat) {
        self.target = target;
    }

    pub fn preview(&self) -> Option<ResourceHandle> {
        self.preview
    }

    /// Bytes and MIME type behind the current preview.
    pub fn preview_resource(&self) -> Option<&Resource> {
        self.preview.and_then(|h| self.resources.get(h))
    }

    pub fn preview_uri(&self) -> Option<String> {
        self.preview.and_then(|h| self.resources.data_uri(h))
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    pub fn result_uri(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|r| self.resources.data_uri(r.handle))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a decode that timed out or was cancelled is still running.
    pub fn decode_in_flight(&self) -> bool {
        self.worker.is_busy()
    }

    /// Number of blobs currently held (preview + result at most).
    pub fn live_resources(&self) -> usize {
        self.resources.live_count()
    }

    fn policy(&self, cancel: Option<CancelToken>) -> WaitPolicy {
        let policy = WaitPolicy::new(self.options.decode_timeout);
        match cancel {
            Some(token) => policy.with_cancel(token),
            None => policy,
        }
    }

    fn drop_result(&mut self) {
        if let Some(result) = self.result.take() {
            self.resources.release(result.handle);
        }
    }

    fn drop_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            self.resources.release(handle);
        }
    }

    /// Replace the current selection and build its preview.
    pub fn select(&mut self, selection: SourceSelection) -> PreviewStatus {
        self.drop_result();
        self.drop_preview();
        self.last_error = None;

        log::info!(
            "selected {} ({} bytes, {})",
            selection.file_name,
            selection.len,
            selection.declared_mime.as_deref().unwrap_or("unknown type")
        );

        let preview = if selection.is_heic() {
            let policy = self.policy(None);
            decode_heic(
                &self.decoder,
                &selection.bytes,
                PREVIEW_FORMAT,
                &policy,
                &mut self.worker,
            )
            .map(|bytes| (bytes, PREVIEW_FORMAT.mime().to_string()))
            .map_err(|err| match err {
                ConvertError::HeicDecode(inner) => ConvertError::PreviewDecode(inner),
                other => other,
            })
        } else {
            let mime = selection
                .declared_mime
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            Ok((selection.bytes.to_vec(), mime))
        };
        self.selection = Some(selection);

        match preview {
            Ok((bytes, mime)) => {
                let handle = self.resources.register(bytes, mime);
                self.preview = Some(handle);
                PreviewStatus::Ready(handle)
            }
            Err(err) => {
                log::warn!("preview unavailable: {err}");
                self.last_error = Some(err.to_string());
                PreviewStatus::Unavailable(err)
            }
        }
    }

    /// Convert the current selection to the current target.
    pub fn convert(&mut self) -> Result<&ConversionResult, ConvertError> {
        self.convert_with(None)
    }

    /// [`convert`](Self::convert) with a token that aborts the decode wait.
    pub fn convert_with(
        &mut self,
        cancel: Option<CancelToken>,
    ) -> Result<&ConversionResult, ConvertError> {
        self.drop_result();
        self.last_error = None;

        match self.run_conversion(cancel) {
            Ok(result) => Ok(self.result.insert(result)),
            Err(err) => {
                log::error!("conversion failed: {err}");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn run_conversion(
        &mut self,
        cancel: Option<CancelToken>,
    ) -> Result<ConversionResult, ConvertError> {
        let selection = self.selection.as_ref().ok_or(ConvertError::NoSelection)?;
        let target = self.target;
        let policy = self.policy(cancel);

        log::info!("converting {} to {}", selection.file_name, target.label());
        let raster_input: Arc<[u8]> = if selection.is_heic() {
            Arc::from(decode_heic(
                &self.decoder,
                &selection.bytes,
                target,
                &policy,
                &mut self.worker,
            )?)
        } else {
            Arc::clone(&selection.bytes)
        };

        let encoded = run_pipeline(
            &self.backend,
            raster_input,
            target,
            &policy,
            &mut self.worker,
        )?;
        let (width, height) = (encoded.width, encoded.height);
        let handle = self.resources.register(encoded.bytes, target.mime());

        let sized = self
            .resources
            .data_uri(handle)
            .ok_or_else(|| ConvertError::InvalidDataUri(format!("{handle} vanished")))
            .and_then(|uri| size_from_data_uri(&uri));
        let size = match sized {
            Ok(size) => size,
            Err(err) => {
                self.resources.release(handle);
                return Err(err);
            }
        };

        log::info!("converted to {} ({size}, {width}x{height})", target.label());
        Ok(ConversionResult {
            handle,
            format: target,
            size,
            width,
            height,
        })
    }

    /// Save the current result through `sink` as `converted-image.<ext>`.
    pub fn download(&self, sink: &dyn DownloadSink) -> Result<PathBuf, ConvertError> {
        let result = self.result.as_ref().ok_or(ConvertError::NoResult)?;
        let resource = self
            .resources
            .get(result.handle)
            .ok_or(ConvertError::NoResult)?;
        let path = sink.save(&result.file_name(), &resource.mime, &resource.bytes)?;
        Ok(path)
    }

    /// Reset source, preview and result together.
    pub fn clear(&mut self) {
        self.drop_result();
        self.drop_preview();
        self.selection = None;
        self.last_error = None;
        log::info!("selection cleared");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}
