//! Devices command handler

use crate::domain::error::AcquisitionError;
use crate::infrastructure::CpalCaptureProvider;

use super::presenter::Presenter;

/// List input devices, marking the default one
pub fn handle_devices_command(presenter: &Presenter) -> Result<(), AcquisitionError> {
    let names = CpalCaptureProvider::input_device_names()?;
    if names.is_empty() {
        presenter.warn("No audio input devices found");
        return Ok(());
    }

    let default = CpalCaptureProvider::default_device_name();
    for name in &names {
        presenter.output(&format_device(name, default.as_deref() == Some(name.as_str())));
    }
    Ok(())
}

fn format_device(name: &str, is_default: bool) -> String {
    if is_default {
        format!("{} (default)", name)
    } else {
        name.to_string()
    }
}
