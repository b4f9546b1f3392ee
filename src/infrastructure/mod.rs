//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with audio hardware and the filesystem.

pub mod config;
pub mod export;
pub mod playback;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use export::FileExporter;
pub use playback::RodioPreviewPlayer;
pub use recording::{CpalCaptureProvider, MemoryCaptureProvider};
