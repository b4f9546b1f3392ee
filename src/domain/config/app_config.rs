//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Log level used when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input device name (default input device when unset)
    pub device: Option<String>,
    /// Preferred capture sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Preferred channel count
    pub channels: Option<u16>,
    /// Interval between emitted fragments (e.g. "250ms", "1s")
    pub timeslice: Option<String>,
    /// Directory previews are saved into
    pub output_dir: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            device: None,
            sample_rate: None,
            channels: None,
            timeslice: Some(Duration::default_timeslice().to_string()),
            output_dir: None,
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            device: other.device.or(self.device),
            sample_rate: other.sample_rate.or(self.sample_rate),
            channels: other.channels.or(self.channels),
            timeslice: other.timeslice.or(self.timeslice),
            output_dir: other.output_dir.or(self.output_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get timeslice as parsed Duration, or default if not set/invalid
    pub fn timeslice_or_default(&self) -> Duration {
        self.timeslice
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_timeslice)
    }

    /// Get the output directory, falling back to the user's audio
    /// directory and then the working directory
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(dirs::audio_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get log level, or "warn" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.device.is_none());
        assert!(config.sample_rate.is_none());
        assert!(config.channels.is_none());
        assert_eq!(config.timeslice, Some("1s".to_string()));
        assert_eq!(config.log_level, Some("warn".to_string()));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.device.is_none());
        assert!(config.timeslice.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            device: Some("USB Mic".to_string()),
            timeslice: Some("1s".to_string()),
            sample_rate: Some(48000),
            ..Default::default()
        };

        let other = AppConfig {
            device: Some("Built-in".to_string()),
            timeslice: None, // Should not override
            sample_rate: Some(16000),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.device, Some("Built-in".to_string()));
        assert_eq!(merged.timeslice, Some("1s".to_string())); // Kept from base
        assert_eq!(merged.sample_rate, Some(16000));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            channels: Some(2),
            output_dir: Some("/tmp/clips".to_string()),
            ..Default::default()
        };

        let merged = base.clone().merge(AppConfig::empty());
        assert_eq!(merged, base);
    }

    #[test]
    fn timeslice_or_default_parses() {
        let config = AppConfig {
            timeslice: Some("250ms".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timeslice_or_default().as_millis(), 250);
    }

    #[test]
    fn timeslice_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            timeslice: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timeslice_or_default().as_millis(), 1000);
        assert_eq!(AppConfig::empty().timeslice_or_default().as_millis(), 1000);
    }

    #[test]
    fn output_dir_prefers_configured_value() {
        let config = AppConfig {
            output_dir: Some("/tmp/clips".to_string()),
            ..Default::default()
        };
        assert_eq!(config.output_dir_or_default(), PathBuf::from("/tmp/clips"));
    }

    #[test]
    fn log_level_or_default() {
        assert_eq!(AppConfig::empty().log_level_or_default(), "warn");
        let config = AppConfig {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(config.log_level_or_default(), "debug");
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig {
            device: Some("USB Mic".to_string()),
            sample_rate: Some(44100),
            ..AppConfig::defaults()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
