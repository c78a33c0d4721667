//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Source
//!     holiday.heic (2481503 bytes, image/heic)
//! Preview
//!     ready (blob:1)
//! Result
//!     WEBP 1.87 MB (4032x3024)
//!     File: converted-image.webp
//! Saved → out/converted-image.webp
//! ```
//!
//! A failed preview shows the reason instead of the handle:
//!
//! ```text
//! Preview
//!     unavailable: HEIC preview decode failed: ...
//! ```
//!
//! ## Formats
//!
//! ```text
//! Input
//!     image/png
//!     ...
//! Targets
//!     PNG  image/png   .png
//!     ...
//! HEIC decoding: enabled
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::format::{ACCEPTED_MIME_TYPES, TargetFormat};
use crate::package::ConversionResult;
use crate::session::{PreviewStatus, SourceSelection};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Session output
// ============================================================================

pub fn format_selection(selection: &SourceSelection) -> Vec<String> {
    vec![
        "Source".to_string(),
        format!(
            "{}{} ({} bytes, {})",
            indent(1),
            selection.file_name,
            selection.len,
            selection.declared_mime.as_deref().unwrap_or("unknown type")
        ),
    ]
}

pub fn format_preview_status(status: &PreviewStatus) -> Vec<String> {
    let detail = match status {
        PreviewStatus::Ready(handle) => format!("ready ({handle})"),
        PreviewStatus::Unavailable(err) => format!("unavailable: {err}"),
    };
    vec!["Preview".to_string(), format!("{}{}", indent(1), detail)]
}

pub fn format_result(result: &ConversionResult) -> Vec<String> {
    vec![
        "Result".to_string(),
        format!(
            "{}{} {} ({}x{})",
            indent(1),
            result.label(),
            result.size,
            result.width,
            result.height
        ),
        format!("{}File: {}", indent(1), result.file_name()),
    ]
}

pub fn format_saved(path: &Path) -> Vec<String> {
    vec![format!("Saved \u{2192} {}", path.display())]
}

/// Accepted inputs, available targets and whether HEIC decoding was built in.
pub fn format_formats() -> Vec<String> {
    let mut lines = vec!["Input".to_string()];
    for mime in ACCEPTED_MIME_TYPES {
        lines.push(format!("{}{}", indent(1), mime));
    }
    lines.push("Targets".to_string());
    for target in TargetFormat::ALL {
        lines.push(format!(
            "{}{:<5}{:<12}.{}",
            indent(1),
            target.label(),
            target.mime(),
            target.extension()
        ));
    }
    lines.push(if cfg!(feature = "heic") {
        "HEIC decoding: enabled".to_string()
    } else {
        "HEIC decoding: disabled (rebuild with --features heic)".to_string()
    });
    lines
}

// ============================================================================
// Printers
// ============================================================================

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_selection(selection: &SourceSelection) {
    print_lines(format_selection(selection));
}

pub fn print_preview_status(status: &PreviewStatus) {
    print_lines(format_preview_status(status));
}

pub fn print_result(result: &ConversionResult) {
    print_lines(format_result(result));
}

pub fn print_saved(path: &Path) {
    print_lines(format_saved(path));
}

pub fn print_formats() {
    print_lines(format_formats());
}
