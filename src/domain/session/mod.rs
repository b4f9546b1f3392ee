//! Recording session entity and its read model

mod recording_session;
mod snapshot;

pub use recording_session::{
    DiscardOutcome, FragmentOutcome, RecordingSession, StopIntent, StopOutcome,
};
pub use snapshot::{ErrorSummary, PreviewSummary, SessionSnapshot};
