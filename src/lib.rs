//! ClipRecorder - terminal audio clip recorder
//!
//! This crate wraps the platform's audio capture into a recording session
//! with start/pause/resume/stop/discard semantics and exposes the finished
//! take as a previewable, downloadable audio artifact.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: The recording session state machine, value objects, and errors
//! - **Application**: The session controller and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, rodio playback, config store)
//! - **CLI**: The interactive presentation layer, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
