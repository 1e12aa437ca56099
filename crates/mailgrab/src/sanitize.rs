//! Helpers for sanitizing data before it reaches logs or the filesystem.
//!
//! Delta links carry a continuation token and error bodies may echo request
//! details, so neither is logged verbatim. Attachment names come from
//! arbitrary senders and are reduced to a safe file name component.

use std::path::Path;

/// Maximum length for response bodies included in logs and errors.
pub const MAX_BODY_LENGTH: usize = 200;

/// Maximum length of a sanitized file name, in bytes.
const MAX_FILENAME_LENGTH: usize = 200;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops the query string from a URL.
///
/// - `https://graph.microsoft.com/v1.0/me/messages/delta?$deltatoken=abc` →
///   `https://graph.microsoft.com/v1.0/me/messages/delta?…`
/// - `https://graph.microsoft.com/v1.0/users` → unchanged
pub fn redact_url(url: &str) -> String {
    match url.find('?') {
        Some(pos) => format!("{}?…", &url[..pos]),
        None => url.to_string(),
    }
}

/// Truncates a response body to [`MAX_BODY_LENGTH`] bytes on a char boundary.
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_BODY_LENGTH {
        return trimmed.to_string();
    }

    let mut end = MAX_BODY_LENGTH;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &trimmed[..end])
}

/// Reduces an attachment name to a single safe path component.
///
/// Path separators and control characters become `_`, leading and trailing
/// dots/spaces are stripped, and the result is never empty.
pub fn safe_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == ':' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');

    if trimmed.is_empty() {
        return "attachment".to_string();
    }

    if trimmed.len() <= MAX_FILENAME_LENGTH {
        return trimmed.to_string();
    }

    // Keep the extension when shortening.
    let ext = trimmed
        .rfind('.')
        .map(|pos| &trimmed[pos..])
        .filter(|ext| ext.len() <= 16)
        .unwrap_or("");
    let mut end = MAX_FILENAME_LENGTH - ext.len();
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &trimmed[..end], ext)
}
