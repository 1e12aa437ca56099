use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::sanitize::safe_file_name;

/// Timestamp prefix of stored attachments, UTC at second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Upper bound on numbered variants tried for a taken name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes attachment payloads into a single output directory.
///
/// Files are named `<timestamp>_<attachment name>` and are never overwritten:
/// when a name is taken, `_2`, `_3`, ... is inserted before the extension.
pub struct AttachmentStorage {
    output_directory: PathBuf,
}

impl AttachmentStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Creates the output directory if it does not exist yet.
    pub fn ensure_directory(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.output_directory).map_err(|e| {
            StorageError::CreateDirectory {
                path: self.output_directory.clone(),
                source: e,
            }
        })
    }

    /// Stores `content` under a name stamped with the current time.
    pub fn store(&self, attachment_name: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        self.store_at(attachment_name, content, Utc::now())
    }

    /// Stores `content` under a name stamped with `timestamp`.
    pub fn store_at(
        &self,
        attachment_name: &str,
        content: &[u8],
        timestamp: DateTime<Utc>,
    ) -> Result<PathBuf, StorageError> {
        let filename = format!(
            "{}_{}",
            timestamp.format(TIMESTAMP_FORMAT),
            safe_file_name(attachment_name)
        );
        self.create_exclusive(&filename, content)
    }

    /// Creates the file with `O_CREAT | O_EXCL`, falling back to numbered
    /// variants while the name is taken.
    fn create_exclusive(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        let (base, ext) = split_extension(filename);

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                format!("{}_{}{}", base, counter, ext)
            };
            let try_path = self.output_directory.join(&try_filename);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .and_then(|_| file.flush())
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(self.output_directory.join(filename)))
    }
}

/// Splits `name.ext` into (`name`, `.ext`). Names without a dot, or whose
/// only dot is leading, have an empty extension.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    }
}
