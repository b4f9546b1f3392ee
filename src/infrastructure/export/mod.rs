//! Preview export adapters

mod file;

pub use file::FileExporter;
