//! Filesystem preview exporter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{ExportError, PreviewExporter};
use crate::domain::recording::PreviewArtifact;

/// Writes previews into a directory under their download file name
pub struct FileExporter {
    dir: PathBuf,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PreviewExporter for FileExporter {
    async fn export(&self, preview: &PreviewArtifact) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::CreateDir {
                path: self.dir.clone(),
                message: e.to_string(),
            })?;

        let path = self.dir.join(preview.file_name());
        fs::write(&path, preview.data())
            .await
            .map_err(|e| ExportError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), bytes = preview.size_bytes(), "preview exported");
        Ok(path)
    }
}
