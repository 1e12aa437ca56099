//! Persisted delta cursor.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Snapshot persisted between runs. No cursor means the next run is a first run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "deltaLink", default)]
    pub delta_link: Option<String>,
}

impl State {
    pub fn with_delta_link(delta_link: impl Into<String>) -> Self {
        Self {
            delta_link: Some(delta_link.into()),
        }
    }
}

/// Reads and writes [`State`] as a small JSON file.
///
/// There is no locking: only one run may use a given state file at a time.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state, returning the default state when the file is absent.
    pub fn load(&self) -> Result<State, StateError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No state file at {}, starting without a delta cursor",
                    self.path.display()
                );
                return Ok(State::default());
            }
            Err(e) => {
                return Err(StateError::ReadFile {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let state: State =
            serde_json::from_str(&content).map_err(|e| StateError::Malformed {
                path: self.path.clone(),
                source: e,
            })?;

        debug!(
            "Loaded state from {} (delta cursor present: {})",
            self.path.display(),
            state.delta_link.is_some()
        );
        Ok(state)
    }

    /// Saves the state by writing a sibling temp file and renaming it over
    /// the target, so an interrupted write leaves the previous file intact.
    pub fn save(&self, state: &State) -> Result<(), StateError> {
        let json = serde_json::to_string(state).map_err(StateError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let tmp_path = self.tmp_path();
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| StateError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StateError::WriteFile {
                path: tmp_path.clone(),
                source: e,
            })?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            self.write_error(e)
        })?;

        debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> StateError {
        StateError::WriteFile {
            path: self.path.clone(),
            source,
        }
    }
}
