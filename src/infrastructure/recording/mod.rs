//! Capture device adapters
//!
//! cpal drives real input hardware; the in-memory adapter stands in for
//! it wherever no hardware is available.

mod cpal_device;
mod memory;
mod wav_stream;

pub use cpal_device::{CpalCaptureDevice, CpalCaptureProvider, CpalStream};
pub use memory::{
    AcquisitionGate, DeviceCommand, MemoryCaptureDevice, MemoryCaptureProvider, MemoryDeviceProbe,
    MemoryStream,
};
pub use wav_stream::{decode_stream, encode_samples, stream_header, DecodedPcm, PcmSpec, WavError};
