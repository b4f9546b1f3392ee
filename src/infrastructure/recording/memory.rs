//! In-memory capture adapter
//!
//! A capture provider with no audio hardware behind it. The paired
//! `MemoryDeviceProbe` plays the device's part: it emits fragments,
//! errors and stop confirmations on demand and records which commands
//! the device received.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::application::ports::{
    AcquisitionError, CaptureDevice, CaptureProvider, DeviceError, DeviceEvent, DeviceEvents,
    DeviceSubscription, RecorderOptions, StreamConstraints,
};
use crate::domain::recording::AudioFragment;

/// Command received by a memory device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

/// Handle for driving a memory device from the outside
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceProbe {
    events: DeviceEvents,
    commands: Arc<StdMutex<Vec<DeviceCommand>>>,
    failure: Arc<StdMutex<Option<DeviceError>>>,
    constraints: Arc<StdMutex<Option<StreamConstraints>>>,
    options: Arc<StdMutex<Option<RecorderOptions>>>,
}

impl MemoryDeviceProbe {
    /// Deliver a fragment; `false` when no observer is attached
    pub fn emit_fragment(&self, data: &[u8]) -> bool {
        self.events
            .emit(DeviceEvent::FragmentAvailable(AudioFragment::from_bytes(data)))
    }

    pub fn emit_error(&self, error: DeviceError) -> bool {
        self.events.emit(DeviceEvent::Error(error))
    }

    pub fn emit_stopped(&self) -> bool {
        self.events.emit(DeviceEvent::Stopped)
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    /// Make the next device command fail with `error`
    pub fn fail_next_command(&self, error: DeviceError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.events.is_attached()
    }

    /// Constraints passed to the last stream request
    pub fn constraints(&self) -> Option<StreamConstraints> {
        self.constraints.lock().ok().and_then(|c| c.clone())
    }

    /// Options the device was created with
    pub fn options(&self) -> Option<RecorderOptions> {
        self.options.lock().ok().and_then(|o| o.clone())
    }

    fn receive(&self, command: DeviceCommand) -> Result<(), DeviceError> {
        if let Some(error) = self.failure.lock().ok().and_then(|mut f| f.take()) {
            return Err(error);
        }
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        Ok(())
    }
}

/// Releases a gated acquisition
#[derive(Debug)]
pub struct AcquisitionGate(oneshot::Sender<()>);

impl AcquisitionGate {
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// Capture provider backed by a `MemoryDeviceProbe`
#[derive(Debug)]
pub struct MemoryCaptureProvider {
    outcome: Result<(), AcquisitionError>,
    gate: StdMutex<Option<oneshot::Receiver<()>>>,
    probe: MemoryDeviceProbe,
}

impl MemoryCaptureProvider {
    /// Provider whose acquisition succeeds immediately
    pub fn new() -> (Self, MemoryDeviceProbe) {
        let probe = MemoryDeviceProbe::default();
        let provider = Self {
            outcome: Ok(()),
            gate: StdMutex::new(None),
            probe: probe.clone(),
        };
        (provider, probe)
    }

    /// Provider whose acquisition fails with `error`
    pub fn failing(error: AcquisitionError) -> Self {
        Self {
            outcome: Err(error),
            gate: StdMutex::new(None),
            probe: MemoryDeviceProbe::default(),
        }
    }

    /// Provider whose acquisition succeeds once the gate is opened
    pub fn gated() -> (Self, MemoryDeviceProbe, AcquisitionGate) {
        let (tx, rx) = oneshot::channel();
        let (mut provider, probe) = Self::new();
        provider.gate = StdMutex::new(Some(rx));
        (provider, probe, AcquisitionGate(tx))
    }
}

/// Stream handed out by `MemoryCaptureProvider`
#[derive(Debug)]
pub struct MemoryStream {
    probe: MemoryDeviceProbe,
}

#[async_trait]
impl CaptureProvider for MemoryCaptureProvider {
    type Stream = MemoryStream;
    type Device = MemoryCaptureDevice;

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<MemoryStream, AcquisitionError> {
        if let Ok(mut last) = self.probe.constraints.lock() {
            *last = Some(constraints.clone());
        }

        let gate = self.gate.lock().ok().and_then(|mut gate| gate.take());
        if let Some(gate) = gate {
            // A dropped gate releases the acquisition as well
            let _ = gate.await;
        }

        self.outcome.clone().map(|()| MemoryStream {
            probe: self.probe.clone(),
        })
    }

    fn create_device(
        &self,
        stream: MemoryStream,
        options: &RecorderOptions,
    ) -> Result<MemoryCaptureDevice, AcquisitionError> {
        if let Ok(mut last) = stream.probe.options.lock() {
            *last = Some(options.clone());
        }
        Ok(MemoryCaptureDevice {
            probe: stream.probe,
        })
    }
}

/// Capture device whose events come from a probe
#[derive(Debug)]
pub struct MemoryCaptureDevice {
    probe: MemoryDeviceProbe,
}

impl CaptureDevice for MemoryCaptureDevice {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.probe.receive(DeviceCommand::Start)
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.probe.receive(DeviceCommand::Pause)
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.probe.receive(DeviceCommand::Resume)
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.probe.receive(DeviceCommand::Stop)
    }

    fn subscribe(&mut self) -> DeviceSubscription {
        self.probe.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquisition_records_constraints_and_options() {
        let (provider, probe) = MemoryCaptureProvider::new();
        let constraints = StreamConstraints {
            device: Some("USB Mic".into()),
            ..Default::default()
        };

        let stream = provider.request_stream(&constraints).await.unwrap();
        provider
            .create_device(stream, &RecorderOptions::default())
            .unwrap();

        assert_eq!(probe.constraints(), Some(constraints));
        assert_eq!(probe.options(), Some(RecorderOptions::default()));
    }

    #[tokio::test]
    async fn failing_provider_reports_error() {
        let provider = MemoryCaptureProvider::failing(AcquisitionError::NoDevice);
        let result = provider.request_stream(&StreamConstraints::default()).await;
        assert_eq!(result.err(), Some(AcquisitionError::NoDevice));
    }

    #[test]
    fn failure_applies_to_one_command() {
        let probe = MemoryDeviceProbe::default();
        let mut device = MemoryCaptureDevice {
            probe: probe.clone(),
        };

        probe.fail_next_command(DeviceError::Disconnected);
        assert_eq!(device.start(), Err(DeviceError::Disconnected));
        assert_eq!(device.start(), Ok(()));
        assert_eq!(probe.commands(), vec![DeviceCommand::Start]);
    }

    #[test]
    fn events_require_subscriber() {
        let probe = MemoryDeviceProbe::default();
        let mut device = MemoryCaptureDevice {
            probe: probe.clone(),
        };
        assert!(!probe.emit_stopped());

        let mut subscription = device.subscribe();
        assert!(probe.emit_fragment(b"x"));
        assert_eq!(
            subscription.try_next(),
            Some(DeviceEvent::FragmentAvailable(AudioFragment::from_bytes(b"x")))
        );
    }
}
