//! Secret resolution from configuration values.
//!
//! A secret can be supplied in two ways, checked in priority order:
//!
//! 1. **Direct value** - the setting itself (e.g., `AZ_CLIENT_SECRET=...`)
//! 2. **File reference** - Docker secrets pattern (e.g., `AZ_CLIENT_SECRET_FILE=/run/secrets/graph`)

use secrecy::SecretString;
use std::fs;

/// Suffix appended to a setting name to form its file-reference variant.
pub const FILE_SUFFIX: &str = "_FILE";

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need a direct value or a file path)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },
}

/// Result type for secret resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from a direct value or, failing that, a file.
///
/// Empty direct values are ignored. File contents are trimmed since secret
/// files commonly end with a newline.
pub fn resolve_secret(direct: Option<&str>, file_path: Option<&str>) -> Result<SecretString> {
    if let Some(value) = direct {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    if let Some(path) = file_path {
        if !path.trim().is_empty() {
            let expanded = expand_home(path.trim());
            let content = fs::read_to_string(&expanded).map_err(|e| {
                SecretError::FileReadError {
                    path: expanded.clone(),
                    source: e,
                }
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile { path: expanded });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Returns the name of the file-reference setting for `key`.
pub fn file_key(key: &str) -> String {
    format!("{}{}", key, FILE_SUFFIX)
}

/// Expands `~` to the user's home directory.
///
/// Only `~` and `~/path` are supported, not `~user/path`.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
