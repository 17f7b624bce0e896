//! Export seam: where a captured thumbnail goes when the user saves it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::errors::ExportError;
use crate::thumbnail::ThumbnailImage;

/// Receives an encoded thumbnail under a file name
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Store the image, returning where it ended up
    async fn save(&self, file_name: &str, image: &ThumbnailImage) -> Result<PathBuf, ExportError>;
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReceipt {
    pub file_name: String,
    pub location: PathBuf,
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
}

/// Reject names that are empty or would leave the target directory.
pub fn validate_file_name(name: &str) -> Result<(), ExportError> {
    if name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(ExportError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Writes exported thumbnails into a directory
#[derive(Debug, Clone)]
pub struct DirectoryExport {
    dir: PathBuf,
}

impl DirectoryExport {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for DirectoryExport {
    async fn save(&self, file_name: &str, image: &ThumbnailImage) -> Result<PathBuf, ExportError> {
        validate_file_name(file_name)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, image.bytes()).await?;

        debug!(path = %path.display(), bytes = image.len(), "wrote thumbnail");
        Ok(path)
    }
}
