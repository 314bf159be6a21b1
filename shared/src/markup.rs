//! Cell markup for every visible state.

use crate::{PayloadStyle, ResolvedPayload};

const MARKER_STYLE: &str = "padding: 4px; font-size: 11px;";
const CONTENT_STYLE: &str = "padding: 4px; font-size: 11px; color: #000000; line-height: 1.3;";
const ERROR_COLOR: &str = "#ff0000";
const LOADING_COLOR: &str = "#666";
/// Background of cells whose commenter is not a row administrator.
pub const HIGHLIGHT_BACKGROUND: &str = "#fff4ce";

/// Grey "Loading..." marker.
pub fn loading() -> String {
    marker(LOADING_COLOR, "Loading...")
}

/// Red "No ID" marker.
pub fn no_id() -> String {
    marker(ERROR_COLOR, "No ID")
}

/// Red "Error" marker.
pub fn error() -> String {
    marker(ERROR_COLOR, "Error")
}

/// Renders a resolved payload. `Empty` becomes an empty string so the cell
/// shows nothing at all.
pub fn payload(payload: &ResolvedPayload) -> String {
    let ResolvedPayload::Content {
        lines, ..
    } = payload
    else {
        return String::new();
    };

    let background = match payload.style() {
        PayloadStyle::Plain => String::new(),
        PayloadStyle::Transparent => " background-color: transparent;".to_string(),
        PayloadStyle::Highlighted => format!(" background-color: {HIGHLIGHT_BACKGROUND};"),
    };
    let body = lines
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("<br>");
    format!("<div style=\"{CONTENT_STYLE}{background}\">{body}</div>")
}

fn marker(color: &str, text: &str) -> String {
    format!("<div style=\"{MARKER_STYLE} color: {color};\">{text}</div>")
}

/// Escapes text for insertion between tags.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
