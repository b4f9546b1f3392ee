//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS, VALID_LOG_LEVELS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    let value = read_value(&config, key);
    presenter.output(value.as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "device" => {
            if value.trim().is_empty() {
                return Err(invalid("Device name must not be empty".to_string()));
            }
            config.device = Some(value.to_string());
        }
        "sample_rate" => {
            let rate = value
                .parse::<u32>()
                .ok()
                .filter(|rate| (8_000..=192_000).contains(rate))
                .ok_or_else(|| invalid("Value must be a rate between 8000 and 192000".to_string()))?;
            config.sample_rate = Some(rate);
        }
        "channels" => {
            let channels = value
                .parse::<u16>()
                .ok()
                .filter(|channels| (1..=8).contains(channels))
                .ok_or_else(|| invalid("Value must be between 1 and 8".to_string()))?;
            config.channels = Some(channels);
        }
        "timeslice" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            config.timeslice = Some(value.to_string());
        }
        "output_dir" => config.output_dir = Some(value.to_string()),
        "log_level" => {
            let level = value.to_lowercase();
            if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                return Err(invalid(format!(
                    "Invalid value '{}'. Valid options: {}",
                    value,
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
            config.log_level = Some(level);
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }

    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "device" => config.device.clone(),
        "sample_rate" => config.sample_rate.map(|r| r.to_string()),
        "channels" => config.channels.map(|c| c.to_string()),
        "timeslice" => config.timeslice.clone(),
        "output_dir" => config.output_dir.clone(),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(key: &str, value: &str) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::empty();
        apply_value(&mut config, key, value).map(|()| config)
    }

    #[test]
    fn timeslice_valid() {
        assert_eq!(apply("timeslice", "250ms").unwrap().timeslice, Some("250ms".to_string()));
        assert!(apply("timeslice", "1s500ms").is_ok());
        assert!(apply("timeslice", "2m").is_ok());
    }

    #[test]
    fn timeslice_invalid() {
        assert!(apply("timeslice", "soon").is_err());
        assert!(apply("timeslice", "0ms").is_err());
    }

    #[test]
    fn sample_rate_bounds() {
        assert_eq!(apply("sample_rate", "44100").unwrap().sample_rate, Some(44100));
        assert!(apply("sample_rate", "4000").is_err());
        assert!(apply("sample_rate", "fast").is_err());
    }

    #[test]
    fn channels_bounds() {
        assert_eq!(apply("channels", "2").unwrap().channels, Some(2));
        assert!(apply("channels", "0").is_err());
        assert!(apply("channels", "9").is_err());
    }

    #[test]
    fn log_level_is_normalized() {
        assert_eq!(apply("log_level", "DEBUG").unwrap().log_level, Some("debug".to_string()));
        assert!(apply("log_level", "loud").is_err());
    }

    #[test]
    fn device_must_not_be_blank() {
        assert!(apply("device", "  ").is_err());
        assert_eq!(apply("device", "USB Mic").unwrap().device, Some("USB Mic".to_string()));
    }

    #[test]
    fn read_value_formats_numbers() {
        let config = AppConfig {
            sample_rate: Some(16000),
            channels: Some(1),
            ..Default::default()
        };
        assert_eq!(read_value(&config, "sample_rate"), Some("16000".to_string()));
        assert_eq!(read_value(&config, "channels"), Some("1".to_string()));
        assert_eq!(read_value(&config, "device"), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = ensure_known_key("api_key").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
    }
}
