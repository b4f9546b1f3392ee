//! Preview playback port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::PreviewArtifact;

/// Errors that can occur during preview playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The artifact could not be decoded
    #[error("Cannot decode preview: {0}")]
    Decode(String),

    /// Failed to play the preview
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// No audio output device available
    #[error("Audio output not available: {0}")]
    DeviceNotAvailable(String),
}

/// Port trait for listening to a preview
#[async_trait]
pub trait PreviewPlayer: Send + Sync {
    /// Play the preview to the end
    async fn play(&self, preview: &PreviewArtifact) -> Result<(), PlaybackError>;
}
