//! Audio input device enumeration.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};

use super::CaptureError;

/// Description of one input device.
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// List all available audio input devices on the system.
///
/// # Errors
/// Returns an error if no audio input devices are found.
pub fn list_audio_devices() -> Result<Vec<AudioDeviceInfo>> {
    let host = cpal::default_host();
    let default_device_name = host
        .default_input_device()
        .and_then(|d| d.description().ok())
        .map(|d| d.to_string());

    let mut devices = Vec::new();
    for device in host.input_devices()? {
        if let Ok(desc) = device.description() {
            let name = desc.to_string();
            devices.push(AudioDeviceInfo {
                name: name.clone(),
                is_default: default_device_name.as_ref() == Some(&name),
            });
        }
    }

    if devices.is_empty() {
        anyhow::bail!("No audio input devices found");
    }

    Ok(devices)
}

/// Find the input device selected in settings, or the system default.
pub(super) fn select_input_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();

    match name {
        Some(wanted) => {
            let devices = host
                .input_devices()
                .map_err(|e| CaptureError::Device(e.to_string()))?;
            for device in devices {
                if let Ok(desc) = device.description()
                    && desc.to_string() == wanted
                {
                    return Ok(device);
                }
            }
            Err(CaptureError::DeviceNotFound(wanted.to_string()))
        }
        None => host
            .default_input_device()
            .ok_or(CaptureError::NoDefaultDevice),
    }
}
