//! Preview export ("download") port

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::PreviewArtifact;

/// Errors that can occur while saving a preview
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {path}: {message}")]
    CreateDir { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Port for persisting a preview outside the session
#[async_trait]
pub trait PreviewExporter: Send + Sync {
    /// Save the preview under its download file name.
    ///
    /// # Returns
    /// The path that was written
    async fn export(&self, preview: &PreviewArtifact) -> Result<PathBuf, ExportError>;
}
