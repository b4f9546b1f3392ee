//! Recording session state machine

use std::collections::VecDeque;

use crate::domain::error::{AcquisitionError, DeviceError, SessionError};
use crate::domain::recording::{AudioFragment, AudioMimeType, PreviewArtifact, RecorderPhase};

use super::snapshot::SessionSnapshot;

/// What should happen once the device confirms a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopIntent {
    /// Assemble a preview from the buffered fragments
    Keep,
    /// Throw the take away
    Discard,
}

/// Result of a discard request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardOutcome {
    /// A take was active; the device must be told to stop
    StopDevice,
    /// The device is already finalizing; the pending stop now discards
    AlreadyStopping,
    /// Nothing to discard
    Inert,
}

/// Result of delivering a fragment to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    Buffered,
    Dropped,
}

/// Result of a device stopped event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// A preview was assembled and published
    PreviewReady,
    /// The stop belonged to a discarded take
    Discarded,
    /// The take produced no audio, so no preview was published
    Empty,
    /// No stop was pending and no take was active
    Ignored,
}

/// Recording session entity.
/// Owns every piece of mutable recording state; all changes go through
/// the methods below, which are inert when their precondition fails.
///
/// State machine:
///   INACTIVE -> RECORDING (begin_recording)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> INACTIVE (request_stop, request_discard, record_device_error)
///
/// Every stop or discard queues a `StopIntent` that is consumed, oldest
/// first, by `device_stopped`.
#[derive(Debug)]
pub struct RecordingSession {
    phase: RecorderPhase,
    fragments: Vec<AudioFragment>,
    pending_stops: VecDeque<StopIntent>,
    preview: Option<PreviewArtifact>,
    last_error: Option<SessionError>,
    is_acquiring: bool,
}

impl RecordingSession {
    /// Create a session that is waiting for device acquisition
    pub fn new() -> Self {
        Self {
            phase: RecorderPhase::Inactive,
            fragments: Vec::new(),
            pending_stops: VecDeque::new(),
            preview: None,
            last_error: None,
            is_acquiring: true,
        }
    }

    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    pub fn fragments(&self) -> &[AudioFragment] {
        &self.fragments
    }

    pub fn preview(&self) -> Option<&PreviewArtifact> {
        self.preview.as_ref()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn is_acquiring(&self) -> bool {
        self.is_acquiring
    }

    /// Start is refused while acquiring or while a take is in progress
    pub fn cannot_start(&self) -> bool {
        self.is_acquiring || self.phase != RecorderPhase::Inactive
    }

    /// Whether the oldest pending stop will discard its take
    pub fn discard_requested(&self) -> bool {
        self.pending_stops.front() == Some(&StopIntent::Discard)
    }

    /// Number of stops still waiting for the device to confirm
    pub fn pending_stops(&self) -> usize {
        self.pending_stops.len()
    }

    /// Acquisition completed with a live device
    pub fn acquisition_succeeded(&mut self) {
        self.is_acquiring = false;
    }

    /// Acquisition failed; the session never gets a device
    pub fn acquisition_failed(&mut self, error: AcquisitionError) {
        self.last_error = Some(SessionError::Acquisition(error));
        self.is_acquiring = false;
    }

    /// INACTIVE -> RECORDING, resetting the previous take.
    /// A stop that is still finalizing is superseded and will not publish.
    pub fn begin_recording(&mut self) -> bool {
        if self.cannot_start() {
            return false;
        }
        self.supersede_pending_stops();
        self.fragments.clear();
        self.preview = None;
        self.phase = RecorderPhase::Recording;
        true
    }

    /// RECORDING -> PAUSED
    pub fn pause(&mut self) -> bool {
        if self.phase != RecorderPhase::Recording {
            return false;
        }
        self.phase = RecorderPhase::Paused;
        true
    }

    /// PAUSED -> RECORDING
    pub fn resume(&mut self) -> bool {
        if self.phase != RecorderPhase::Paused {
            return false;
        }
        self.phase = RecorderPhase::Recording;
        true
    }

    /// RECORDING | PAUSED -> INACTIVE, keeping the take.
    /// The preview is assembled later, when the device confirms the stop.
    pub fn request_stop(&mut self) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        self.pending_stops.push_back(StopIntent::Keep);
        self.phase = RecorderPhase::Inactive;
        true
    }

    /// Throw away the current take.
    ///
    /// Applies while a take is active, and also after `request_stop` until
    /// the device confirms it. Calling it again is a no-op.
    pub fn request_discard(&mut self) -> DiscardOutcome {
        if self.phase.is_active() {
            self.pending_stops.push_back(StopIntent::Discard);
            self.clear_preview();
            self.phase = RecorderPhase::Inactive;
            return DiscardOutcome::StopDevice;
        }

        if self.pending_stops.contains(&StopIntent::Keep) {
            self.supersede_pending_stops();
            self.clear_preview();
            return DiscardOutcome::AlreadyStopping;
        }

        DiscardOutcome::Inert
    }

    /// Drop buffered fragments and the preview
    pub fn clear_preview(&mut self) {
        self.fragments.clear();
        self.preview = None;
    }

    /// Route a fragment emitted by the device.
    ///
    /// While a stop is pending the fragment belongs to the oldest pending
    /// take and is kept only if that take is kept. Otherwise fragments are
    /// accepted while a take is active. The device emits nothing while
    /// paused, so a fragment applied during a pause was cut before it.
    pub fn accept_fragment(&mut self, fragment: AudioFragment) -> FragmentOutcome {
        let accept = match self.pending_stops.front() {
            Some(StopIntent::Keep) => true,
            Some(StopIntent::Discard) => false,
            None => self.phase.is_active(),
        };

        if accept {
            self.fragments.push(fragment);
            FragmentOutcome::Buffered
        } else {
            FragmentOutcome::Dropped
        }
    }

    /// Device failed mid-capture: abandon the take and surface the error
    /// Stops already sent still get their stopped event, which then discards.
    pub fn record_device_error(&mut self, error: DeviceError) {
        self.last_error = Some(SessionError::Device(error));
        self.fragments.clear();
        self.supersede_pending_stops();
        self.phase = RecorderPhase::Inactive;
    }

    /// The device finished finalizing a take
    pub fn device_stopped(&mut self, mime_type: AudioMimeType) -> StopOutcome {
        match self.pending_stops.pop_front() {
            Some(StopIntent::Discard) => StopOutcome::Discarded,
            Some(StopIntent::Keep) => self.publish_preview(mime_type),
            None if self.phase.is_active() => {
                // The device stopped on its own
                self.phase = RecorderPhase::Inactive;
                self.publish_preview(mime_type)
            }
            None => StopOutcome::Ignored,
        }
    }

    /// Read model for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    fn supersede_pending_stops(&mut self) {
        for intent in self.pending_stops.iter_mut() {
            *intent = StopIntent::Discard;
        }
    }

    fn publish_preview(&mut self, mime_type: AudioMimeType) -> StopOutcome {
        if self.fragments.is_empty() {
            return StopOutcome::Empty;
        }
        self.preview = Some(PreviewArtifact::assemble(&self.fragments, mime_type));
        StopOutcome::PreviewReady
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    fn ready_session() -> RecordingSession {
        let mut session = RecordingSession::new();
        session.acquisition_succeeded();
        session
    }

    fn fragment(bytes: &str) -> AudioFragment {
        AudioFragment::from_bytes(bytes.as_bytes())
    }

    fn preview_bytes(session: &RecordingSession) -> Option<Vec<u8>> {
        session.preview().map(|p| p.data().to_vec())
    }

    #[test]
    fn new_session_is_acquiring_and_inactive() {
        let session = RecordingSession::new();
        assert!(session.is_acquiring());
        assert_eq!(session.phase(), RecorderPhase::Inactive);
        assert!(session.cannot_start());
        assert!(session.preview().is_none());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn start_refused_while_acquiring() {
        let mut session = RecordingSession::new();
        assert!(!session.begin_recording());
        assert_eq!(session.phase(), RecorderPhase::Inactive);
    }

    #[test]
    fn cannot_start_tracks_phase() {
        let mut session = ready_session();
        assert!(!session.cannot_start());

        session.begin_recording();
        assert!(session.cannot_start());

        session.pause();
        assert!(session.cannot_start());

        session.request_stop();
        assert!(!session.cannot_start());
    }

    #[test]
    fn acquisition_failure_is_recorded() {
        let mut session = RecordingSession::new();
        session.acquisition_failed(AcquisitionError::PermissionDenied("denied".into()));

        assert!(!session.is_acquiring());
        assert!(!session.cannot_start());
        let err = session.last_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::AcquisitionFailure);
    }

    #[test]
    fn pause_and_resume_require_matching_phase() {
        let mut session = ready_session();
        assert!(!session.pause());
        assert!(!session.resume());

        session.begin_recording();
        assert!(!session.resume());
        assert!(session.pause());
        assert_eq!(session.phase(), RecorderPhase::Paused);
        assert!(!session.pause());
        assert!(session.resume());
        assert_eq!(session.phase(), RecorderPhase::Recording);
    }

    #[test]
    fn stop_assembles_preview_on_device_stopped() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.accept_fragment(fragment("b"));
        session.accept_fragment(fragment("c"));

        assert!(session.request_stop());
        assert_eq!(session.phase(), RecorderPhase::Inactive);
        assert!(session.preview().is_none());

        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::PreviewReady);
        assert_eq!(preview_bytes(&session), Some(b"abc".to_vec()));
    }

    #[test]
    fn terminal_flush_after_stop_is_kept() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.request_stop();

        assert_eq!(session.accept_fragment(fragment("z")), FragmentOutcome::Buffered);
        session.device_stopped(AudioMimeType::Wav);
        assert_eq!(preview_bytes(&session), Some(b"az".to_vec()));
    }

    #[test]
    fn fragments_dropped_while_idle() {
        let mut session = ready_session();
        assert_eq!(session.accept_fragment(fragment("x")), FragmentOutcome::Dropped);
        assert!(session.fragments().is_empty());
    }

    #[test]
    fn fragment_cut_before_pause_survives_it() {
        let mut session = ready_session();
        session.begin_recording();
        session.pause();
        assert_eq!(session.accept_fragment(fragment("a")), FragmentOutcome::Buffered);

        session.resume();
        session.accept_fragment(fragment("b"));
        session.request_stop();
        session.device_stopped(AudioMimeType::Wav);
        assert_eq!(preview_bytes(&session), Some(b"ab".to_vec()));
    }

    #[test]
    fn discard_skips_preview_and_consumes_flag() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));

        assert_eq!(session.request_discard(), DiscardOutcome::StopDevice);
        assert!(session.discard_requested());
        assert!(session.fragments().is_empty());
        assert_eq!(session.phase(), RecorderPhase::Inactive);

        // Late flush after the discard
        assert_eq!(session.accept_fragment(fragment("b")), FragmentOutcome::Dropped);

        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Discarded);
        assert!(!session.discard_requested());
        assert!(session.preview().is_none());
        assert!(session.fragments().is_empty());
    }

    #[test]
    fn discard_is_idempotent() {
        let mut session = ready_session();
        session.begin_recording();
        assert_eq!(session.request_discard(), DiscardOutcome::StopDevice);
        assert_eq!(session.request_discard(), DiscardOutcome::Inert);
        assert_eq!(session.pending_stops(), 1);
    }

    #[test]
    fn discard_after_stop_before_device_confirms() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.request_stop();

        assert_eq!(session.request_discard(), DiscardOutcome::AlreadyStopping);
        session.accept_fragment(fragment("b"));
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Discarded);
        assert!(session.preview().is_none());
        assert!(session.fragments().is_empty());
    }

    #[test]
    fn restart_supersedes_pending_stop() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("old"));
        session.request_stop();

        assert!(session.begin_recording());
        // Flush and stop of the previous take arrive after the restart
        assert_eq!(session.accept_fragment(fragment("late")), FragmentOutcome::Dropped);
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Discarded);
        assert_eq!(session.phase(), RecorderPhase::Recording);

        session.accept_fragment(fragment("new"));
        session.request_stop();
        session.device_stopped(AudioMimeType::Wav);
        assert_eq!(preview_bytes(&session), Some(b"new".to_vec()));
    }

    #[test]
    fn start_clears_previous_preview() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.request_stop();
        session.device_stopped(AudioMimeType::Wav);
        assert!(session.preview().is_some());

        session.begin_recording();
        assert!(session.preview().is_none());
        assert!(session.fragments().is_empty());
    }

    #[test]
    fn clear_preview_is_idempotent() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.request_stop();
        session.device_stopped(AudioMimeType::Wav);

        session.clear_preview();
        let once = (session.fragments().len(), session.preview().is_none());
        session.clear_preview();
        let twice = (session.fragments().len(), session.preview().is_none());
        assert_eq!(once, (0, true));
        assert_eq!(once, twice);
    }

    #[test]
    fn device_error_abandons_take() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));

        session.record_device_error(DeviceError::StreamFailed("overrun".into()));
        assert_eq!(session.phase(), RecorderPhase::Inactive);
        assert!(session.fragments().is_empty());
        assert_eq!(
            session.last_error().map(SessionError::kind),
            Some(ErrorKind::DeviceRuntimeFailure)
        );

        // Whatever the halted device still delivers is ignored
        assert_eq!(session.accept_fragment(fragment("b")), FragmentOutcome::Dropped);
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Ignored);
        assert!(session.preview().is_none());
    }

    #[test]
    fn device_error_while_stop_pending_suppresses_preview() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));
        session.request_stop();

        session.record_device_error(DeviceError::StreamFailed("lost".into()));
        session.accept_fragment(fragment("b"));
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Discarded);
        assert!(session.preview().is_none());
        assert_eq!(session.pending_stops(), 0);
    }

    #[test]
    fn stopped_owed_before_device_error_does_not_end_next_take() {
        let mut session = ready_session();
        session.begin_recording();
        session.request_stop();
        session.record_device_error(DeviceError::StreamFailed("lost".into()));

        session.begin_recording();
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Discarded);
        assert_eq!(session.phase(), RecorderPhase::Recording);
        assert!(session.preview().is_none());

        session.accept_fragment(fragment("new"));
        session.request_stop();
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::PreviewReady);
        assert_eq!(preview_bytes(&session), Some(b"new".to_vec()));
    }

    #[test]
    fn spontaneous_device_stop_publishes_take() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("a"));

        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::PreviewReady);
        assert_eq!(session.phase(), RecorderPhase::Inactive);
        assert_eq!(preview_bytes(&session), Some(b"a".to_vec()));
    }

    #[test]
    fn empty_take_publishes_no_preview() {
        let mut session = ready_session();
        session.begin_recording();
        session.request_stop();
        assert_eq!(session.device_stopped(AudioMimeType::Wav), StopOutcome::Empty);
        assert!(session.preview().is_none());
    }

    #[test]
    fn pause_resume_keeps_order() {
        let mut session = ready_session();
        session.begin_recording();
        session.accept_fragment(fragment("1"));
        session.pause();
        session.resume();
        session.accept_fragment(fragment("2"));
        session.request_stop();
        session.accept_fragment(fragment("3"));
        session.device_stopped(AudioMimeType::Wav);
        assert_eq!(preview_bytes(&session), Some(b"123".to_vec()));
    }
}
