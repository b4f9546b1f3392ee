//! Capture device port interfaces
//!
//! A `CaptureProvider` turns a stream request into a live `CaptureDevice`.
//! Devices report what they produce through `DeviceEvents`: the device
//! keeps one observer slot, and whoever holds the `DeviceSubscription`
//! receives the events until it is dropped.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::recording::{AudioFragment, AudioMimeType, Duration};

pub use crate::domain::error::{AcquisitionError, DeviceError};

/// What the caller asks of the audio input stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Input device name; the default input device when `None`
    pub device: Option<String>,
    /// Preferred sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Preferred channel count
    pub channels: Option<u16>,
}

/// Encoding configuration for a device handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderOptions {
    /// MIME type of the emitted fragments
    pub mime_type: AudioMimeType,
    /// Interval between fragment emissions while recording
    pub timeslice: Duration,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            mime_type: AudioMimeType::Wav,
            timeslice: Duration::default_timeslice(),
        }
    }
}

/// Notifications delivered by a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A chunk of encoded audio is ready
    FragmentAvailable(AudioFragment),
    /// The device failed while capturing
    Error(DeviceError),
    /// The device finished finalizing after a stop.
    /// Always delivered after every fragment of the same take.
    Stopped,
}

type EventSender = mpsc::UnboundedSender<DeviceEvent>;

/// Observer slot owned by a capture device
#[derive(Debug, Clone, Default)]
pub struct DeviceEvents {
    slot: Arc<StdMutex<Option<EventSender>>>,
}

impl DeviceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new observer, replacing any previous one
    pub fn subscribe(&self) -> DeviceSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(tx);
        }
        DeviceSubscription {
            events: rx,
            slot: Arc::clone(&self.slot),
        }
    }

    /// Deliver an event to the attached observer.
    /// Returns `false` when nobody is listening.
    pub fn emit(&self, event: DeviceEvent) -> bool {
        match self.slot.lock() {
            Ok(slot) => slot.as_ref().is_some_and(|tx| tx.send(event).is_ok()),
            Err(_) => false,
        }
    }

    /// Whether an observer is currently attached
    pub fn is_attached(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

/// Receiving end of a device's events.
/// Dropping it detaches the observer from the device.
#[derive(Debug)]
pub struct DeviceSubscription {
    events: mpsc::UnboundedReceiver<DeviceEvent>,
    slot: Arc<StdMutex<Option<EventSender>>>,
}

impl DeviceSubscription {
    /// Wait for the next event; `None` once the device side is gone
    pub async fn next(&mut self) -> Option<DeviceEvent> {
        self.events.recv().await
    }

    /// Take an already-delivered event without waiting
    pub fn try_next(&mut self) -> Option<DeviceEvent> {
        self.events.try_recv().ok()
    }

    /// Detach explicitly (same as dropping)
    pub fn detach(self) {}
}

impl Drop for DeviceSubscription {
    fn drop(&mut self) {
        self.events.close();
        if let Ok(mut slot) = self.slot.lock() {
            // Only clear the slot if it still points at this subscription
            if slot.as_ref().is_some_and(|tx| tx.is_closed()) {
                *slot = None;
            }
        }
    }
}

/// Port for obtaining audio input streams
#[async_trait]
pub trait CaptureProvider: Send + Sync + 'static {
    /// Live audio input stream
    type Stream: Send + 'static;
    /// Device handle built on top of a stream
    type Device: CaptureDevice + 'static;

    /// Request an audio input stream.
    /// Fails with `PermissionDenied`, `NoDevice`, or `Other`.
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Self::Stream, AcquisitionError>;

    /// Bind a device handle to an acquired stream
    fn create_device(
        &self,
        stream: Self::Stream,
        options: &RecorderOptions,
    ) -> Result<Self::Device, AcquisitionError>;
}

/// Port for a live capture device.
///
/// Commands return once the device has accepted them; fragments, errors
/// and the stopped notification arrive asynchronously through the
/// subscription.
pub trait CaptureDevice: Send {
    /// Begin emitting fragments for a new take
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Stop emitting fragments until resumed
    fn pause(&mut self) -> Result<(), DeviceError>;

    /// Continue a paused take
    fn resume(&mut self) -> Result<(), DeviceError>;

    /// Flush remaining audio, then emit `Stopped`
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Attach the observer for this device's events
    fn subscribe(&mut self) -> DeviceSubscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_subscriber_in_order() {
        let events = DeviceEvents::new();
        let mut sub = events.subscribe();

        assert!(events.emit(DeviceEvent::FragmentAvailable(AudioFragment::from_bytes(b"a"))));
        assert!(events.emit(DeviceEvent::Stopped));

        assert_eq!(
            sub.try_next(),
            Some(DeviceEvent::FragmentAvailable(AudioFragment::from_bytes(b"a")))
        );
        assert_eq!(sub.try_next(), Some(DeviceEvent::Stopped));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn emit_without_subscriber_is_discarded() {
        let events = DeviceEvents::new();
        assert!(!events.is_attached());
        assert!(!events.emit(DeviceEvent::Stopped));
    }

    #[test]
    fn dropping_subscription_detaches() {
        let events = DeviceEvents::new();
        let sub = events.subscribe();
        assert!(events.is_attached());

        drop(sub);
        assert!(!events.is_attached());
        assert!(!events.emit(DeviceEvent::Stopped));
    }

    #[test]
    fn detach_is_explicit_drop() {
        let events = DeviceEvents::new();
        events.subscribe().detach();
        assert!(!events.is_attached());
    }

    #[test]
    fn resubscribe_replaces_previous_observer() {
        let events = DeviceEvents::new();
        let old = events.subscribe();
        let mut new = events.subscribe();

        // Dropping the stale subscription must not detach the new one
        drop(old);
        assert!(events.is_attached());
        assert!(events.emit(DeviceEvent::Stopped));
        assert_eq!(new.try_next(), Some(DeviceEvent::Stopped));
    }

    #[test]
    fn default_recorder_options() {
        let options = RecorderOptions::default();
        assert_eq!(options.mime_type, AudioMimeType::Wav);
        assert_eq!(options.timeslice.as_millis(), 1000);
    }
}
