// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Device, utils::cuda_is_available, utils::metal_is_available};

use clutter_core::constant;
use clutter_core::error::ClutterError;

/// Select a compute device by name
///
/// # Examples
///
/// ```
/// use clutter_neural::device::select_device;
///
/// assert!(select_device("cpu").is_ok());
/// assert!(select_device("tpu").is_err());
/// ```
pub fn select_device(name: &str) -> Result<Device, ClutterError> {
    let name = name.to_lowercase();

    if !constant::DEVICES.contains(&name.as_str()) {
        return Err(ClutterError::ModelError(format!(
            "Invalid device {}. Must be one of: {:?}.",
            name,
            constant::DEVICES
        )));
    }

    match name.as_str() {
        "cuda" if cuda_is_available() => {
            Device::new_cuda(0).map_err(|err| ClutterError::ModelError(err.to_string()))
        }
        "metal" if metal_is_available() => {
            Device::new_metal(0).map_err(|err| ClutterError::ModelError(err.to_string()))
        }
        "cpu" => Ok(Device::Cpu),
        _ => Err(ClutterError::ModelError(format!(
            "Device '{}' specified but no {} device was detected.",
            name, name
        ))),
    }
}
