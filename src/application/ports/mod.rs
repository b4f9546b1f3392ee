//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod exporter;
pub mod player;

// Re-export common types
pub use capture::{
    AcquisitionError, CaptureDevice, CaptureProvider, DeviceError, DeviceEvent, DeviceEvents,
    DeviceSubscription, RecorderOptions, StreamConstraints,
};
pub use config::ConfigStore;
pub use exporter::{ExportError, PreviewExporter};
pub use player::{PlaybackError, PreviewPlayer};
