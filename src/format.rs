//! Format tokens and input format detection.
//!
//! Two independent questions are answered here:
//!
//! - **Which format do we encode to?** [`TargetFormat`] is the closed set of
//!   targets the converter offers. Each variant knows its MIME type (used for
//!   encode requests and data URIs), its download extension, and its display
//!   label.
//! - **Is the input HEIC?** [`is_heic`] looks at the declared MIME type *and*
//!   the filename suffix. Browsers and file managers report HEIC
//!   inconsistently (`image/heic`, `image/heif`, empty, or
//!   `application/octet-stream`), so neither check alone is reliable.
//!
//! Everything that is not HEIC goes straight to the raster pipeline, which
//! detects the real format from magic bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// MIME types offered by the file picker.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/heic",
];

const HEIC_MIME_TYPES: &[&str] = &["image/heic", "image/heif"];
const HEIC_SUFFIXES: &[&str] = &[".heic", ".heif"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported target format: {0} (expected png, jpeg or webp)")]
    Unsupported(String),
}

/// Raster format a conversion encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl TargetFormat {
    /// All targets in the order the UI lists them.
    pub const ALL: [TargetFormat; 3] = [Self::Png, Self::Jpeg, Self::Webp];

    /// Parse a user-facing token. `jpg` is accepted as an alias of `jpeg`.
    pub fn parse(token: &str) -> Result<Self, FormatError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(FormatError::Unsupported(other.to_string())),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// Extension used for the downloaded file. Always the token itself,
    /// so JPEG downloads end in `.jpeg`, not `.jpg`.
    pub fn extension(self) -> &'static str {
        self.token()
    }

    /// Uppercase token shown next to a conversion result.
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WEBP",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TargetFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether an input must go through the HEIC decoder.
///
/// True when the declared MIME type is a HEIC/HEIF type or the filename ends
/// in `.heic`/`.heif`. Comparisons ignore ASCII case.
pub fn is_heic(declared_mime: Option<&str>, file_name: &str) -> bool {
    let by_mime = declared_mime.is_some_and(|mime| {
        let mime = mime.trim();
        HEIC_MIME_TYPES
            .iter()
            .any(|heic| mime.eq_ignore_ascii_case(heic))
    });
    let lower_name = file_name.to_ascii_lowercase();
    let by_suffix = HEIC_SUFFIXES
        .iter()
        .any(|suffix| lower_name.ends_with(suffix));
    by_mime || by_suffix
}

/// Sniff a MIME type from the leading bytes of a file.
///
/// Stands in for the MIME type a browser attaches to a picked file. Returns
/// `None` for content `infer` does not recognise.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}
