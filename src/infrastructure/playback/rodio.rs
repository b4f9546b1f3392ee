//! Rodio-based preview player
//!
//! Plays a preview artifact on the default output device.

use std::io::Cursor;

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, Sink};

use crate::application::ports::{PlaybackError, PreviewPlayer};
use crate::domain::recording::{AudioMimeType, PreviewArtifact};
use crate::infrastructure::recording::decode_stream;

/// Preview player using rodio
pub struct RodioPreviewPlayer;

impl RodioPreviewPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPreviewPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewPlayer for RodioPreviewPlayer {
    async fn play(&self, preview: &PreviewArtifact) -> Result<(), PlaybackError> {
        let data = preview.data().to_vec();
        let mime_type = preview.mime_type();

        // Run audio playback in blocking thread to avoid blocking the async runtime
        tokio::task::spawn_blocking(move || play_sync(data, mime_type))
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Play a preview synchronously (called from spawn_blocking)
fn play_sync(data: Vec<u8>, mime_type: AudioMimeType) -> Result<(), PlaybackError> {
    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;

    match mime_type {
        // Streamed WAV headers carry placeholder sizes, which rodio's decoder rejects
        AudioMimeType::Wav => {
            let pcm = decode_stream(&data).map_err(|e| PlaybackError::Decode(e.to_string()))?;
            sink.append(SamplesBuffer::new(
                pcm.spec.channels,
                pcm.spec.sample_rate,
                pcm.samples,
            ));
        }
        _ => {
            let source =
                Decoder::new(Cursor::new(data)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
            sink.append(source);
        }
    }

    // Wait for playback to complete
    sink.sleep_until_end();

    Ok(())
}
