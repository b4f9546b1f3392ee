//! Recording session controller
//!
//! Glues a `RecordingSession` to a capture device. Operations are invoked
//! by the presentation layer; device events and the acquisition result are
//! applied when the caller pumps the controller, so every mutation happens
//! on the caller's thread of control.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, trace, warn};

use crate::domain::error::{AcquisitionError, DeviceError, SessionError};
use crate::domain::recording::{AudioMimeType, PreviewArtifact, RecorderPhase};
use crate::domain::session::{
    DiscardOutcome, FragmentOutcome, RecordingSession, SessionSnapshot, StopOutcome,
};

use super::ports::{
    CaptureDevice, CaptureProvider, DeviceEvent, DeviceSubscription, RecorderOptions,
    StreamConstraints,
};

/// What changed after an acquisition result or device event was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The capture device is ready
    Acquired,
    /// No device could be acquired; the session stays without one
    AcquisitionFailed(AcquisitionError),
    /// A fragment was added to the current take
    FragmentBuffered { bytes: usize },
    /// A fragment arrived for a discarded or inactive take
    FragmentDropped,
    /// The device failed and the take was abandoned
    DeviceFailed(DeviceError),
    /// A preview was assembled from the finished take
    PreviewReady,
    /// The device finished a discarded take
    TakeDiscarded,
    /// The finished take held no audio
    EmptyTake,
    /// A stopped event arrived with nothing to finish
    StopIgnored,
}

type PendingAcquisition<D> = oneshot::Receiver<Result<D, AcquisitionError>>;

/// Session controller owning the session state and its capture device
pub struct RecordingController<P: CaptureProvider> {
    session: RecordingSession,
    device: Option<P::Device>,
    subscription: Option<DeviceSubscription>,
    acquisition: Option<PendingAcquisition<P::Device>>,
    mime_type: AudioMimeType,
}

impl<P: CaptureProvider> RecordingController<P> {
    /// Create a session and immediately start acquiring a capture device.
    ///
    /// Must be called from within a tokio runtime. Acquisition runs once;
    /// if it fails, a new controller is needed to try again.
    pub fn new(provider: Arc<P>, constraints: StreamConstraints, options: RecorderOptions) -> Self {
        let mime_type = options.mime_type;
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = match provider.request_stream(&constraints).await {
                Ok(stream) => provider.create_device(stream, &options),
                Err(e) => Err(e),
            };
            if tx.send(result).is_err() {
                debug!("session disposed before acquisition settled, releasing device");
            }
        });

        Self {
            session: RecordingSession::new(),
            device: None,
            subscription: None,
            acquisition: Some(rx),
            mime_type,
        }
    }

    pub fn phase(&self) -> RecorderPhase {
        self.session.phase()
    }

    /// Guard for the start affordance
    pub fn cannot_start(&self) -> bool {
        self.session.cannot_start()
    }

    pub fn is_acquiring(&self) -> bool {
        self.session.is_acquiring()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.session.last_error()
    }

    pub fn preview(&self) -> Option<&PreviewArtifact> {
        self.session.preview()
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Begin a new take, clearing the previous one
    pub fn start(&mut self) {
        if self.session.cannot_start() {
            debug!(
                phase = %self.session.phase(),
                acquiring = self.session.is_acquiring(),
                "start ignored"
            );
            return;
        }
        if self.command("start", |device| device.start()) {
            self.session.begin_recording();
            info!("recording started");
        }
    }

    pub fn pause(&mut self) {
        if self.session.phase() != RecorderPhase::Recording {
            debug!(phase = %self.session.phase(), "pause ignored");
            return;
        }
        if self.command("pause", |device| device.pause()) {
            self.session.pause();
            info!("recording paused");
        }
    }

    pub fn resume(&mut self) {
        if self.session.phase() != RecorderPhase::Paused {
            debug!(phase = %self.session.phase(), "resume ignored");
            return;
        }
        if self.command("resume", |device| device.resume()) {
            self.session.resume();
            info!("recording resumed");
        }
    }

    /// Finish the take. The phase drops to inactive right away; the
    /// preview appears once the device confirms the stop.
    pub fn stop(&mut self) {
        if !self.session.phase().is_active() {
            debug!(phase = %self.session.phase(), "stop ignored");
            return;
        }
        if self.command("stop", |device| device.stop()) {
            self.session.request_stop();
            info!("recording stopped, waiting for device to finalize");
        }
    }

    /// Throw the take away, including one that is still finalizing
    pub fn discard(&mut self) {
        match self.session.request_discard() {
            DiscardOutcome::StopDevice => {
                self.command("stop", |device| device.stop());
                info!("recording discarded");
            }
            DiscardOutcome::AlreadyStopping => info!("finalizing take discarded"),
            DiscardOutcome::Inert => debug!("discard ignored: nothing to discard"),
        }
    }

    pub fn clear_preview(&mut self) {
        self.session.clear_preview();
        debug!("preview cleared");
    }

    /// Wait for the acquisition result or the next device event and
    /// apply it. Never resolves once there is nothing left to wait for.
    pub async fn next_update(&mut self) -> SessionUpdate {
        if let Some(acquisition) = self.acquisition.as_mut() {
            let result = acquisition.await.unwrap_or_else(|_| {
                Err(AcquisitionError::Other(
                    "acquisition task ended unexpectedly".to_string(),
                ))
            });
            self.acquisition = None;
            return self.settle_acquisition(result);
        }

        let event = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        };

        match event {
            Some(event) => self.handle_event(event),
            None => {
                self.subscription = None;
                std::future::pending().await
            }
        }
    }

    /// Apply everything that has already arrived without waiting
    pub fn pump(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();

        if let Some(acquisition) = self.acquisition.as_mut() {
            let result = match acquisition.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return updates,
                Err(TryRecvError::Closed) => Err(AcquisitionError::Other(
                    "acquisition task ended unexpectedly".to_string(),
                )),
            };
            self.acquisition = None;
            updates.push(self.settle_acquisition(result));
        }

        while let Some(event) = self
            .subscription
            .as_mut()
            .and_then(DeviceSubscription::try_next)
        {
            updates.push(self.handle_event(event));
        }

        updates
    }

    /// Wait until acquisition has settled.
    ///
    /// # Returns
    /// Whether a capture device is available
    pub async fn wait_until_acquired(&mut self) -> bool {
        if self.acquisition.is_some() {
            self.next_update().await;
        }
        self.has_device()
    }

    /// Tear the session down: detach observers and release the device
    pub fn dispose(mut self) {
        self.release();
    }

    fn command<F>(&mut self, name: &'static str, command: F) -> bool
    where
        F: FnOnce(&mut P::Device) -> Result<(), DeviceError>,
    {
        let Some(device) = self.device.as_mut() else {
            debug!(command = name, "ignored: no capture device");
            return false;
        };
        match command(device) {
            Ok(()) => true,
            Err(e) => {
                warn!(command = name, error = %e, "capture device rejected command");
                self.session.record_device_error(e);
                false
            }
        }
    }

    fn settle_acquisition(&mut self, result: Result<P::Device, AcquisitionError>) -> SessionUpdate {
        match result {
            Ok(mut device) => {
                self.subscription = Some(device.subscribe());
                self.device = Some(device);
                self.session.acquisition_succeeded();
                info!("capture device ready");
                SessionUpdate::Acquired
            }
            Err(e) => {
                warn!(error = %e, "capture device acquisition failed");
                self.session.acquisition_failed(e.clone());
                SessionUpdate::AcquisitionFailed(e)
            }
        }
    }

    fn handle_event(&mut self, event: DeviceEvent) -> SessionUpdate {
        match event {
            DeviceEvent::FragmentAvailable(fragment) => {
                let bytes = fragment.len();
                match self.session.accept_fragment(fragment) {
                    FragmentOutcome::Buffered => {
                        trace!(bytes, "fragment buffered");
                        SessionUpdate::FragmentBuffered { bytes }
                    }
                    FragmentOutcome::Dropped => {
                        debug!(bytes, "fragment dropped");
                        SessionUpdate::FragmentDropped
                    }
                }
            }
            DeviceEvent::Error(e) => {
                warn!(error = %e, "capture device failed, take abandoned");
                self.session.record_device_error(e.clone());
                SessionUpdate::DeviceFailed(e)
            }
            DeviceEvent::Stopped => match self.session.device_stopped(self.mime_type) {
                StopOutcome::PreviewReady => {
                    if let Some(preview) = self.session.preview() {
                        info!(
                            file = %preview.file_name(),
                            size = %preview.human_readable_size(),
                            "preview ready"
                        );
                    }
                    SessionUpdate::PreviewReady
                }
                StopOutcome::Discarded => SessionUpdate::TakeDiscarded,
                StopOutcome::Empty => {
                    debug!("take finished without audio");
                    SessionUpdate::EmptyTake
                }
                StopOutcome::Ignored => SessionUpdate::StopIgnored,
            },
        }
    }

    fn release(&mut self) {
        self.acquisition = None;
        if let Some(subscription) = self.subscription.take() {
            subscription.detach();
        }
        if self.device.take().is_some() {
            debug!("capture device released");
        }
    }
}

impl<P: CaptureProvider> Drop for RecordingController<P> {
    fn drop(&mut self) {
        self.release();
    }
}
