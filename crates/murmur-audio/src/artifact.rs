//! Finished-recording artifact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use murmur_core::error::Result;

/// A captured audio recording on disk.
///
/// Produced by a successful `stop_recording`. The artifact is a transient
/// temp file: whoever consumes it must call [`AudioArtifact::delete`]
/// afterwards, on success and failure alike, so recordings never accumulate.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    path: PathBuf,
    created_at: DateTime<Utc>,
    size_bytes: u64,
}

impl AudioArtifact {
    /// Build an artifact from an existing recording file.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let metadata = std::fs::metadata(&path)?;
        Ok(Self {
            path,
            created_at: Utc::now(),
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// File name component of the recording path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string())
    }

    /// Read the full recording into memory.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Remove the recording file, consuming the artifact.
    pub fn delete(self) -> Result<()> {
        std::fs::remove_file(&self.path)?;
        debug!(path = %self.path.display(), "Audio artifact deleted");
        Ok(())
    }
}
