//! Application layer - Session controller and port interfaces
//!
//! Contains the recording session controller and the trait definitions
//! for external system interactions.

pub mod controller;
pub mod ports;

pub use controller::{RecordingController, SessionUpdate};
