//! Audio fragment and preview artifact value objects

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use serde::Serialize;

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AudioMimeType {
    #[default]
    Wav,
    Ogg,
    Webm,
    Mp4,
    Mpeg,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
            Self::Mpeg => "audio/mpeg",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Mpeg => "mp3",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One opaque chunk of encoded audio emitted by a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFragment {
    data: Vec<u8>,
}

impl AudioFragment {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Playable, downloadable audio assembled from a finished take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    data: Vec<u8>,
    mime_type: AudioMimeType,
    created_at_ms: u64,
}

impl PreviewArtifact {
    /// Concatenate fragments, in order, into one artifact stamped with the
    /// current time.
    pub fn assemble(fragments: &[AudioFragment], mime_type: AudioMimeType) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::assemble_at(fragments, mime_type, created_at_ms)
    }

    /// Concatenate fragments with an explicit creation timestamp
    pub fn assemble_at(fragments: &[AudioFragment], mime_type: AudioMimeType, created_at_ms: u64) -> Self {
        let total: usize = fragments.iter().map(AudioFragment::len).sum();
        let mut data = Vec::with_capacity(total);
        for fragment in fragments {
            data.extend_from_slice(fragment.data());
        }

        Self {
            data,
            mime_type,
            created_at_ms,
        }
    }

    /// Get the raw audio bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Creation time in milliseconds since the Unix epoch
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Download file name, e.g. `Audio-1700000000000.wav`
    pub fn file_name(&self) -> String {
        format!("Audio-{}.{}", self.created_at_ms, self.mime_type.extension())
    }

    /// Self-contained `data:` URI for playback
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type.as_str(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(parts: &[&str]) -> Vec<AudioFragment> {
        parts.iter().map(|p| AudioFragment::from_bytes(p.as_bytes())).collect()
    }

    #[test]
    fn mime_type_strings() {
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
        assert_eq!(AudioMimeType::Webm.as_str(), "audio/webm");
        assert_eq!(AudioMimeType::Mpeg.extension(), "mp3");
        assert_eq!(AudioMimeType::default(), AudioMimeType::Wav);
    }

    #[test]
    fn assemble_concatenates_in_order() {
        let preview = PreviewArtifact::assemble(&fragments(&["ab", "cd", "e"]), AudioMimeType::Wav);
        assert_eq!(preview.data(), b"abcde");
        assert_eq!(preview.size_bytes(), 5);
    }

    #[test]
    fn assemble_stamps_current_time() {
        let preview = PreviewArtifact::assemble(&fragments(&["a"]), AudioMimeType::Wav);
        assert!(preview.created_at_ms() > 0);
    }

    #[test]
    fn file_name_uses_timestamp_and_extension() {
        let preview = PreviewArtifact::assemble_at(&fragments(&["a"]), AudioMimeType::Webm, 1700000000123);
        assert_eq!(preview.file_name(), "Audio-1700000000123.webm");
    }

    #[test]
    fn data_uri_is_base64() {
        let preview = PreviewArtifact::assemble_at(&fragments(&["Hello"]), AudioMimeType::Wav, 1);
        assert_eq!(preview.data_uri(), "data:audio/wav;base64,SGVsbG8=");
    }

    #[test]
    fn human_readable_size() {
        let sized = |len: usize| {
            PreviewArtifact::assemble_at(&[AudioFragment::new(vec![0u8; len])], AudioMimeType::Wav, 1)
        };
        assert_eq!(sized(100).human_readable_size(), "100 B");
        assert_eq!(sized(2048).human_readable_size(), "2.0 KB");
        assert_eq!(sized(1024 * 1024 + 512 * 1024).human_readable_size(), "1.5 MB");
    }
}
