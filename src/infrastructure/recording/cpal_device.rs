//! Cross-platform capture device using cpal
//!
//! `cpal::Stream` is not `Send`, so each acquired stream lives on a
//! dedicated capture thread. The device handle talks to that thread over
//! a command channel; the thread slices the captured samples into WAV
//! fragments every timeslice and reports them through `DeviceEvents`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SizedSample, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::wav_stream::{encode_samples, stream_header, PcmSpec};
use crate::application::ports::{
    AcquisitionError, CaptureDevice, CaptureProvider, DeviceError, DeviceEvent, DeviceEvents,
    DeviceSubscription, RecorderOptions, StreamConstraints,
};
use crate::domain::recording::{AudioFragment, AudioMimeType};

/// Shortest interval the capture thread will slice at
const MIN_TIMESLICE: StdDuration = StdDuration::from_millis(10);

/// Capture provider backed by the default cpal host
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalCaptureProvider;

impl CpalCaptureProvider {
    pub fn new() -> Self {
        Self
    }

    /// Names of the available input devices
    pub fn input_device_names() -> Result<Vec<String>, AcquisitionError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| classify(e.to_string()))?;
        Ok(devices.filter_map(|device| device.name().ok()).collect())
    }

    /// Name of the default input device, if there is one
    pub fn default_device_name() -> Option<String> {
        cpal::default_host()
            .default_input_device()
            .and_then(|device| device.name().ok())
    }
}

/// An open input stream, owned by its capture thread
pub struct CpalStream {
    thread: CaptureThread,
    events: DeviceEvents,
    spec: PcmSpec,
}

impl CpalStream {
    /// Layout of the captured samples
    pub fn spec(&self) -> PcmSpec {
        self.spec
    }
}

#[async_trait]
impl CaptureProvider for CpalCaptureProvider {
    type Stream = CpalStream;
    type Device = CpalCaptureDevice;

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<CpalStream, AcquisitionError> {
        let constraints = constraints.clone();
        let events = DeviceEvents::new();
        let thread_events = events.clone();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (command_tx, command_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("clip-capture".to_string())
            .spawn(move || match open_input(&constraints, &thread_events) {
                Ok((stream, capture, spec)) => {
                    if ready_tx.send(Ok(spec)).is_ok() {
                        run_capture(stream, capture, spec, thread_events, command_rx);
                    }
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| AcquisitionError::Other(format!("Failed to spawn capture thread: {}", e)))?;

        let thread = CaptureThread {
            commands: command_tx,
        };

        let spec = ready_rx.await.map_err(|_| {
            AcquisitionError::Other("Capture thread exited during setup".to_string())
        })??;

        info!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            "input stream open"
        );

        Ok(CpalStream {
            thread,
            events,
            spec,
        })
    }

    fn create_device(
        &self,
        stream: CpalStream,
        options: &RecorderOptions,
    ) -> Result<CpalCaptureDevice, AcquisitionError> {
        if options.mime_type != AudioMimeType::Wav {
            return Err(AcquisitionError::Other(format!(
                "Capture device cannot encode {}",
                options.mime_type
            )));
        }

        let timeslice = options.timeslice.as_std().max(MIN_TIMESLICE);
        stream
            .thread
            .send(Command::Configure { timeslice })
            .map_err(|_| AcquisitionError::Other("Capture thread is gone".to_string()))?;

        Ok(CpalCaptureDevice { stream })
    }
}

/// Device handle for a cpal input stream
pub struct CpalCaptureDevice {
    stream: CpalStream,
}

impl CaptureDevice for CpalCaptureDevice {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.stream.thread.send(Command::Start)
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.stream.thread.send(Command::Pause)
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.stream.thread.send(Command::Resume)
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.stream.thread.send(Command::Stop)
    }

    fn subscribe(&mut self) -> DeviceSubscription {
        self.stream.events.subscribe()
    }
}

#[derive(Debug)]
enum Command {
    Configure { timeslice: StdDuration },
    Start,
    Pause,
    Resume,
    Stop,
    Shutdown,
}

struct CaptureThread {
    commands: mpsc::Sender<Command>,
}

impl CaptureThread {
    fn send(&self, command: Command) -> Result<(), DeviceError> {
        self.commands
            .send(command)
            .map_err(|_| DeviceError::Disconnected)
    }
}

impl Drop for CaptureThread {
    // The thread is not joined: it may still be blocked opening the device
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Samples shared between the audio callback and the capture thread
#[derive(Debug, Default)]
struct SharedCapture {
    samples: StdMutex<Vec<i16>>,
    capturing: AtomicBool,
}

impl SharedCapture {
    fn set_capturing(&self, capturing: bool) {
        self.capturing.store(capturing, Ordering::SeqCst);
    }

    fn push(&self, samples: &[i16]) {
        if !self.capturing.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(mut buffer) = self.samples.lock() {
            buffer.extend_from_slice(samples);
        }
    }

    fn take(&self) -> Vec<i16> {
        self.samples
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default()
    }
}

fn open_input(
    constraints: &StreamConstraints,
    events: &DeviceEvents,
) -> Result<(cpal::Stream, Arc<SharedCapture>, PcmSpec), AcquisitionError> {
    let device = find_input_device(constraints.device.as_deref())?;
    let (config, sample_format) = input_config(&device, constraints)?;

    // Mix down to mono unless a channel count was asked for
    let mixdown = constraints.channels.is_none() && config.channels > 1;
    let spec = PcmSpec {
        sample_rate: config.sample_rate.0,
        channels: if mixdown { 1 } else { config.channels },
    };

    let capture = Arc::new(SharedCapture::default());
    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(&device, &config, &capture, events, mixdown, |s| s)?,
        SampleFormat::F32 => build_stream::<f32>(&device, &config, &capture, events, mixdown, |s| {
            (s.clamp(-1.0, 1.0) * 32767.0) as i16
        })?,
        other => {
            return Err(AcquisitionError::Other(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.play().map_err(|e| match e {
        cpal::PlayStreamError::DeviceNotAvailable => AcquisitionError::NoDevice,
        other => classify(other.to_string()),
    })?;

    Ok((stream, capture, spec))
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device, AcquisitionError> {
    let host = cpal::default_host();
    match name {
        None => host.default_input_device().ok_or(AcquisitionError::NoDevice),
        Some(name) => host
            .input_devices()
            .map_err(|e| classify(e.to_string()))?
            .find(|device| device.name().is_ok_and(|n| n == name))
            .ok_or(AcquisitionError::NoDevice),
    }
}

/// Pick a stream config honoring the requested rate and channel count
fn input_config(
    device: &cpal::Device,
    constraints: &StreamConstraints,
) -> Result<(StreamConfig, SampleFormat), AcquisitionError> {
    if constraints.sample_rate.is_none() && constraints.channels.is_none() {
        let default = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => AcquisitionError::NoDevice,
            other => classify(other.to_string()),
        })?;
        if matches!(default.sample_format(), SampleFormat::I16 | SampleFormat::F32) {
            return Ok((default.config(), default.sample_format()));
        }
    }

    let supported = device.supported_input_configs().map_err(|e| match e {
        cpal::SupportedStreamConfigsError::DeviceNotAvailable => AcquisitionError::NoDevice,
        other => classify(other.to_string()),
    })?;

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for range in supported {
        if range.sample_format() != SampleFormat::I16 && range.sample_format() != SampleFormat::F32 {
            continue;
        }
        if constraints.channels.is_some_and(|c| c != range.channels()) {
            continue;
        }
        if let Some(rate) = constraints.sample_rate {
            if rate < range.min_sample_rate().0 || rate > range.max_sample_rate().0 {
                continue;
            }
        }
        // Prefer fewer channels
        if best.as_ref().map_or(true, |b| range.channels() < b.channels()) {
            best = Some(range);
        }
    }

    let range = best.ok_or_else(|| {
        AcquisitionError::Other("No input config matches the requested format".to_string())
    })?;

    let sample_rate = match constraints.sample_rate {
        Some(rate) => SampleRate(rate),
        None => range.max_sample_rate().min(SampleRate(48000)).max(range.min_sample_rate()),
    };

    let config = StreamConfig {
        channels: range.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, range.sample_format()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    capture: &Arc<SharedCapture>,
    events: &DeviceEvents,
    mixdown: bool,
    convert: fn(T) -> i16,
) -> Result<cpal::Stream, AcquisitionError>
where
    T: SizedSample + Send + 'static,
{
    let channels = config.channels;
    let data_capture = Arc::clone(capture);
    let error_capture = Arc::clone(capture);
    let error_events = events.clone();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<i16> = data.iter().map(|&s| convert(s)).collect();
                if mixdown {
                    data_capture.push(&mix_to_mono(&samples, channels));
                } else {
                    data_capture.push(&samples);
                }
            },
            move |err| {
                error_capture.set_capturing(false);
                warn!(error = %err, "input stream error");
                error_events.emit(DeviceEvent::Error(stream_error(err)));
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => AcquisitionError::NoDevice,
            other => classify(other.to_string()),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TakePhase {
    Idle,
    Recording,
    Paused,
}

/// Per-take state owned by the capture thread
struct Slicer {
    capture: Arc<SharedCapture>,
    events: DeviceEvents,
    spec: PcmSpec,
    header_pending: bool,
}

impl Slicer {
    /// Emit whatever was captured since the last fragment
    fn flush(&mut self) {
        let samples = self.capture.take();
        if samples.is_empty() {
            return;
        }

        let mut data = Vec::new();
        if self.header_pending {
            data = stream_header(self.spec);
            self.header_pending = false;
        }
        data.extend(encode_samples(&samples));

        self.events
            .emit(DeviceEvent::FragmentAvailable(AudioFragment::new(data)));
    }
}

fn run_capture(
    _stream: cpal::Stream,
    capture: Arc<SharedCapture>,
    spec: PcmSpec,
    events: DeviceEvents,
    commands: mpsc::Receiver<Command>,
) {
    let mut slicer = Slicer {
        capture,
        events,
        spec,
        header_pending: false,
    };
    let mut timeslice = crate::domain::recording::Duration::default_timeslice().as_std();
    let mut phase = TakePhase::Idle;
    let mut next_slice = Instant::now();

    loop {
        let received = if phase == TakePhase::Recording {
            commands.recv_timeout(next_slice.saturating_duration_since(Instant::now()))
        } else {
            commands.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };

        match received {
            Ok(Command::Configure { timeslice: t }) => timeslice = t,
            Ok(Command::Start) => {
                slicer.capture.take();
                slicer.header_pending = true;
                slicer.capture.set_capturing(true);
                phase = TakePhase::Recording;
                next_slice = Instant::now() + timeslice;
                debug!("capture started");
            }
            Ok(Command::Pause) => {
                slicer.capture.set_capturing(false);
                if phase == TakePhase::Recording {
                    phase = TakePhase::Paused;
                }
            }
            Ok(Command::Resume) => {
                if phase == TakePhase::Paused {
                    slicer.capture.set_capturing(true);
                    phase = TakePhase::Recording;
                    next_slice = Instant::now() + timeslice;
                }
            }
            Ok(Command::Stop) => {
                slicer.capture.set_capturing(false);
                slicer.flush();
                slicer.events.emit(DeviceEvent::Stopped);
                phase = TakePhase::Idle;
                debug!("capture stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                slicer.flush();
                next_slice = Instant::now() + timeslice;
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    slicer.capture.set_capturing(false);
    debug!("capture thread exiting");
}

/// Average interleaved frames down to one channel
fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn stream_error(err: cpal::StreamError) -> DeviceError {
    match err {
        cpal::StreamError::DeviceNotAvailable => DeviceError::Disconnected,
        other => DeviceError::StreamFailed(other.to_string()),
    }
}

/// Map a backend message onto the acquisition error kinds
fn classify(message: String) -> AcquisitionError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") {
        AcquisitionError::PermissionDenied(message)
    } else {
        AcquisitionError::Other(message)
    }
}
