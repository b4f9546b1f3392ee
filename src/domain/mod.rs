//! Domain layer - Core business logic
//!
//! Contains the recording session entity, value objects, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use error::*;
pub use recording::{AudioFragment, AudioMimeType, Duration, PreviewArtifact, RecorderPhase};
pub use session::{RecordingSession, SessionSnapshot};
