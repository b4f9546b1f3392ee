//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Clip Recorder - record, preview and save short audio clips
#[derive(Parser, Debug)]
#[command(name = "clip-recorder")]
#[command(version)]
#[command(about = "Record short audio clips from the terminal, preview them, save them")]
#[command(long_about = None)]
pub struct Cli {
    /// Input device name (see `clip-recorder devices`)
    #[arg(short = 'D', long, value_name = "NAME", env = "CLIP_RECORDER_DEVICE")]
    pub device: Option<String>,

    /// Preferred capture sample rate in Hz
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Preferred capture channel count
    #[arg(long, value_name = "N")]
    pub channels: Option<u16>,

    /// Interval between emitted fragments (e.g., 250ms, 1s)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeslice: Option<String>,

    /// Directory that `save` writes previews into
    #[arg(short = 'o', long, value_name = "DIR", env = "CLIP_RECORDER_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List available input devices
    Devices,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "device",
    "sample_rate",
    "channels",
    "timeslice",
    "output_dir",
    "log_level",
];

/// Valid log level values
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
