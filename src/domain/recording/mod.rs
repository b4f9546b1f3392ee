//! Recording value objects

mod duration;
mod phase;
mod preview;

pub use duration::{Duration, DEFAULT_TIMESLICE_MS};
pub use phase::RecorderPhase;
pub use preview::{AudioFragment, AudioMimeType, PreviewArtifact};
