//! Conversion results and downloads.
//!
//! A finished conversion is packaged as a [`ConversionResult`]: the handle of
//! the encoded blob, the target's label, and a size string. Saving it goes
//! through a [`DownloadSink`], which receives the fixed file name
//! `converted-image.<ext>` regardless of what the source file was called.
//!
//! The size string is computed from the data URI the way the widget always
//! did: base64-decode the payload and divide its length by 2^20. The unit is
//! labelled `MB` even though it is mebibytes.

use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::resources::ResourceHandle;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Base name of every downloaded file.
pub const DOWNLOAD_BASE_NAME: &str = "converted-image";

const MEBIBYTE: f64 = 1_048_576.0;

/// The single most recent conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub handle: ResourceHandle,
    pub format: TargetFormat,
    pub size: String,
    pub width: u32,
    pub height: u32,
}

impl ConversionResult {
    /// Uppercase target token, e.g. `JPEG`.
    pub fn label(&self) -> &'static str {
        self.format.label()
    }

    pub fn file_name(&self) -> String {
        download_file_name(self.format)
    }
}

/// Serializable summary of a result, used for `--json` output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultSummary {
    pub format: String,
    pub mime: String,
    pub size: String,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
}

impl ResultSummary {
    pub fn new(result: &ConversionResult, saved_to: Option<PathBuf>) -> Self {
        Self {
            format: result.label().to_string(),
            mime: result.format.mime().to_string(),
            size: result.size.clone(),
            width: result.width,
            height: result.height,
            file_name: result.file_name(),
            saved_to,
        }
    }
}

pub fn download_file_name(target: TargetFormat) -> String {
    format!("{DOWNLOAD_BASE_NAME}.{}", target.extension())
}

/// `len / 2^20` to two decimals, suffixed ` MB`.
pub fn format_mebibytes(len: usize) -> String {
    format!("{:.2} MB", len as f64 / MEBIBYTE)
}

/// Size string for the payload embedded in a base64 data URI.
pub fn size_from_data_uri(uri: &str) -> Result<String, ConvertError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| ConvertError::InvalidDataUri("missing ',' separator".into()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(ConvertError::InvalidDataUri(format!(
            "expected a base64 data URI, got header {header:?}"
        )));
    }
    let decoded = STANDARD
        .decode(payload)
        .map_err(|e| ConvertError::InvalidDataUri(e.to_string()))?;
    Ok(format_mebibytes(decoded.len()))
}

/// Where downloads end up.
pub trait DownloadSink {
    /// Save `bytes` under `file_name`, returning the final location.
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes downloads into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        log::info!("saved {} ({mime}) to {}", file_name, path.display());
        Ok(path)
    }
}
