//! Converter configuration.
//!
//! Handles loading, validating, and merging `converter.toml`. The file is
//! sparse: stock defaults are overridden by whatever keys it sets, and CLI
//! flags override the file.
//!
//! ## Config File Location
//!
//! `converter.toml` in the working directory is picked up automatically.
//! Pass `--config <path>` to load a different file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! default_target = "png"         # png | jpeg | webp
//! decode_timeout_ms = 10000      # Upper bound on a single decode
//! max_surface_pixels = 100000000 # Largest width*height we will paint
//!
//! [output]
//! dir = "."                      # Where converted-image.<ext> is saved
//!
//! [page]
//! title = "Image Converter"      # <title> of the rendered widget page
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::format::TargetFormat;
use crate::imaging::{DEFAULT_DECODE_TIMEOUT, DEFAULT_MAX_SURFACE_PIXELS};
use crate::session::SessionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "converter.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `converter.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub conversion: ConversionConfig,
    pub output: OutputConfig,
    pub page: PageConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conversion.decode_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "conversion.decode_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.conversion.max_surface_pixels == 0 {
            return Err(ConfigError::Validation(
                "conversion.max_surface_pixels must be greater than 0".into(),
            ));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output.dir must not be empty".into()));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            default_target: self.conversion.default_target,
            decode_timeout: Duration::from_millis(self.conversion.decode_timeout_ms),
            max_surface_pixels: self.conversion.max_surface_pixels,
        }
    }
}

/// Conversion behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Target selected when a session starts.
    pub default_target: TargetFormat,
    /// Upper bound on a single HEIC decode or bitmap load.
    pub decode_timeout_ms: u64,
    /// Largest surface (width × height) the pipeline will allocate.
    pub max_surface_pixels: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_target: TargetFormat::default(),
            decode_timeout_ms: DEFAULT_DECODE_TIMEOUT.as_millis() as u64,
            max_surface_pixels: DEFAULT_MAX_SURFACE_PIXELS,
        }
    }
}

/// Download destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Rendered widget page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub title: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Image Converter".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConverterConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or from `converter.toml` in the working
/// directory when `path` is `None`.
///
/// An explicitly requested file must exist; the implicit one is optional.
pub fn load_config(path: Option<&Path>) -> Result<ConverterConfig, ConfigError> {
    let overlay = match path {
        Some(explicit) => {
            let value = load_raw_config(explicit)?;
            if value.is_none() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", explicit.display()),
                )));
            }
            value
        }
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `converter.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Converter Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
[conversion]
# Target format selected at startup: "png", "jpeg" or "webp".
default_target = "png"

# Give up on a HEIC decode or bitmap load after this many milliseconds.
decode_timeout_ms = 10000

# Refuse to allocate drawing surfaces larger than this (width * height).
max_surface_pixels = 100000000

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory that receives converted-image.<ext>.
dir = "."

# ---------------------------------------------------------------------------
# Widget page
# ---------------------------------------------------------------------------
[page]
title = "Image Converter"
"##
}
