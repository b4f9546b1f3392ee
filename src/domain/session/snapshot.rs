//! Serializable session read model

use serde::Serialize;

use crate::domain::error::ErrorKind;
use crate::domain::recording::{PreviewArtifact, RecorderPhase};

use super::RecordingSession;

/// Error as shown to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub message: String,
}

/// Preview metadata (the bytes stay in the session)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSummary {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub created_at_ms: u64,
}

impl From<&PreviewArtifact> for PreviewSummary {
    fn from(preview: &PreviewArtifact) -> Self {
        Self {
            file_name: preview.file_name(),
            mime_type: preview.mime_type().as_str().to_string(),
            size_bytes: preview.size_bytes(),
            created_at_ms: preview.created_at_ms(),
        }
    }
}

/// Point-in-time view of a recording session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: RecorderPhase,
    pub cannot_start: bool,
    pub is_acquiring: bool,
    pub buffered_fragments: usize,
    pub error: Option<ErrorSummary>,
    pub preview: Option<PreviewSummary>,
}

impl SessionSnapshot {
    pub(super) fn capture(session: &RecordingSession) -> Self {
        Self {
            phase: session.phase(),
            cannot_start: session.cannot_start(),
            is_acquiring: session.is_acquiring(),
            buffered_fragments: session.fragments().len(),
            error: session.last_error().map(|e| ErrorSummary {
                kind: e.kind(),
                message: e.to_string(),
            }),
            preview: session.preview().map(PreviewSummary::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AcquisitionError;

    #[test]
    fn snapshot_of_new_session() {
        let snapshot = RecordingSession::new().snapshot();
        assert_eq!(snapshot.phase, RecorderPhase::Inactive);
        assert!(snapshot.cannot_start);
        assert!(snapshot.is_acquiring);
        assert!(snapshot.error.is_none());
        assert!(snapshot.preview.is_none());
    }

    #[test]
    fn snapshot_serializes_error_kind() {
        let mut session = RecordingSession::new();
        session.acquisition_failed(AcquisitionError::NoDevice);

        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["phase"], "inactive");
        assert_eq!(json["cannot_start"], false);
        assert_eq!(json["error"]["kind"], "acquisition_failure");
        assert_eq!(json["error"]["message"], "No audio input device available");
        assert!(json["preview"].is_null());
    }
}
