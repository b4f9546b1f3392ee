//! Domain error types

use std::fmt;

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 250ms, 1s, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Failure to obtain a live audio input stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No audio input device available")]
    NoDevice,

    #[error("Failed to open audio input: {0}")]
    Other(String),
}

/// Failure reported by a live capture device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Audio stream error: {0}")]
    StreamFailed(String),

    #[error("Capture device is no longer running")]
    Disconnected,
}

/// Error kinds surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Device or permission unavailable; terminal for the session
    AcquisitionFailure,
    /// Device failed mid-capture; the take was abandoned
    DeviceRuntimeFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquisitionFailure => write!(f, "acquisition failure"),
            Self::DeviceRuntimeFailure => write!(f, "device runtime failure"),
        }
    }
}

/// Last error recorded by a recording session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Acquisition(_) => ErrorKind::AcquisitionFailure,
            Self::Device(_) => ErrorKind::DeviceRuntimeFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_kinds() {
        let err = SessionError::from(AcquisitionError::NoDevice);
        assert_eq!(err.kind(), ErrorKind::AcquisitionFailure);

        let err = SessionError::from(DeviceError::Disconnected);
        assert_eq!(err.kind(), ErrorKind::DeviceRuntimeFailure);
    }

    #[test]
    fn session_error_display_is_transparent() {
        let err = SessionError::from(AcquisitionError::PermissionDenied("blocked".into()));
        assert_eq!(err.to_string(), "Microphone permission denied: blocked");
    }
}
