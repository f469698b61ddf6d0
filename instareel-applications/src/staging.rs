//! Request-scoped staging of uploaded media on local disk

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An uploaded binary blob plus the client-supplied file name
#[derive(Clone)]
pub struct MediaPayload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaPayload {
    pub fn new(file_name: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.map(str::to_string),
            bytes,
        }
    }

    /// Extension hint taken from the file name, lowercased and restricted to
    /// alphanumerics so it can never escape the staging directory
    pub fn extension_or(&self, default: &str) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A file owned by one request; removed when dropped unless already removed.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Write `bytes` to `dir/file_name` and take ownership of the result.
    ///
    /// The guard exists before the write starts, so a partially written file is
    /// still cleaned up when the write fails.
    pub async fn write(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let staged = Self {
            path: dir.join(file_name),
            removed: false,
        };
        tokio::fs::write(&staged.path, bytes).await?;
        debug!(path = %staged.path.display(), bytes = bytes.len(), "Staged media file");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, logging rather than failing if it cannot be removed
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
                }
            }
        }
    }
}
