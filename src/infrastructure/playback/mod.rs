//! Preview playback adapters

mod rodio;

pub use self::rodio::RodioPreviewPlayer;
