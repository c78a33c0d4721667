//! Widget page rendering.
//!
//! Renders a session as a standalone HTML page: file picker, preview, target
//! select, result panel with size string, and a download button. Images are
//! embedded as data URIs so the page has no external references.
//!
//! The page is a snapshot of one session. The picker and the target select
//! are rendered `disabled`; the download button is the only live control.
//!
//! ## Download
//!
//! The button carries the result's data URI and the fixed file name
//! `converted-image.<ext>`. `static/download.js` turns a click into a
//! temporary invisible `<a download>` that is clicked and removed again.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) so every interpolated value is
//! escaped. CSS and JS are embedded at compile time.

use crate::format::{ACCEPTED_MIME_TYPES, TargetFormat};
use crate::session::Session;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = include_str!("../static/widget.css");
const JS: &str = include_str!("../static/download.js");

/// Options that are not part of the session itself.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "Image Converter".to_string(),
        }
    }
}

/// `accept` attribute for the file picker.
///
/// Browsers often report HEIC files with an empty MIME type, so the
/// extensions are listed too.
pub fn accept_attribute() -> String {
    let mut accept: Vec<&str> = ACCEPTED_MIME_TYPES.to_vec();
    accept.extend([".heic", ".heif"]);
    accept.join(",")
}

/// Render the complete widget page for `session`.
pub fn render_page(session: &Session, options: &PageOptions) -> String {
    base_document(&options.title, converter(session, &options.title)).into_string()
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn converter(session: &Session, title: &str) -> Markup {
    html! {
        main class="converter" {
            h1 { (title) }
            label class="field" {
                "Image "
                input type="file" name="source" accept=(accept_attribute()) disabled;
            }
            @if let Some(selection) = session.selection() {
                p class="source-name" { (selection.file_name) }
            }
            (preview(session))
            (target_select(session.target()))
            @if let Some(message) = session.last_error() {
                div class="error" role="alert" { (message) }
            }
            (result_panel(session))
        }
    }
}

fn preview(session: &Session) -> Markup {
    html! {
        div class="preview" {
            @match session.preview_uri() {
                Some(uri) => {
                    img src=(uri) alt="Preview";
                }
                None => {
                    p class="placeholder" { "No preview" }
                }
            }
        }
    }
}

fn target_select(current: TargetFormat) -> Markup {
    html! {
        label class="field" {
            "Convert to "
            select name="target" disabled {
                @for target in TargetFormat::ALL {
                    option value=(target.token()) selected[target == current] {
                        (target.label())
                    }
                }
            }
        }
    }
}

fn result_panel(session: &Session) -> Markup {
    let (Some(result), Some(uri)) = (session.result(), session.result_uri()) else {
        return html! {};
    };
    html! {
        section class="result" {
            p {
                "Converted to "
                strong class="label" { (result.label()) }
                " "
                span class="size" { "(" (result.size) ")" }
            }
            button type="button" data-href=(uri) data-download=(result.file_name()) {
                "Download"
            }
        }
    }
}
