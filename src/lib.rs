//! # Image Converter
//!
//! Converts one image at a time. A PNG, JPEG, WebP or HEIC file goes in; a
//! PNG, JPEG or WebP file named `converted-image.<ext>` comes out, together
//! with a preview of the source and a human-readable size string.
//!
//! # Architecture: One Linear Flow
//!
//! ```text
//! select   bytes        →  preview     (HEIC decoded first, others as-is)
//! convert  selection    →  result      (decode → load → surface → encode)
//! download result       →  converted-image.<ext>
//! ```
//!
//! A [`session::Session`] holds at most one selection, one preview and one
//! result. Selecting a new file clears the old result before anything else
//! happens, so a result always belongs to the selection it was made from.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | Target formats, MIME tokens, HEIC detection |
//! | [`imaging`] | Raster backend, HEIC decoder, bounded waits, the conversion pipeline |
//! | [`resources`] | `blob:<n>` handles for preview and result bytes |
//! | [`package`] | Conversion result, size string, download sinks |
//! | [`session`] | Selection, preview, target and result state |
//! | [`page`] | Standalone HTML widget page rendered with Maud |
//! | [`config`] | `converter.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`error`] | [`error::ConvertError`], the failure taxonomy |
//!
//! # Design Decisions
//!
//! ## Maximum Quality, Fixed
//!
//! Every encode runs at quality 1.0. JPEG maps that to 100; PNG and WebP are
//! lossless. There is no quality knob.
//!
//! ## HEIC Behind a Feature
//!
//! HEIC decoding links the system libheif through `libheif-rs`, so it lives
//! behind the `heic` cargo feature. Without it HEIC input fails with a
//! decode error and every other format works unchanged. The decoder sits
//! behind the [`imaging::HeicDecoder`] trait either way.
//!
//! ## Bounded Waits
//!
//! HEIC decoding and bitmap loading run on a worker thread and the caller
//! polls for the outcome, so a stalled decoder ends in
//! [`error::ConvertError::DecodeTimeout`] instead of hanging the session.

pub mod config;
pub mod error;
pub mod format;
pub mod imaging;
pub mod output;
pub mod package;
pub mod page;
pub mod resources;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
