// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::Path;

use clutter_core::config::ImageType;
use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::ut::track::progress_log;
use clutter_data::data::{Dataset, RealImageDataset};

use crate::config::ClutterConfig;
use crate::device::select_device;
use crate::model::{SegmentationModel, sidecar_path};

/// Load inference settings, trained weights and a prepared real test set
///
/// Hyperparameters come from the JSON sidecar written next to the weights
/// at training time. Defaults are used when no sidecar exists, in which
/// case the weights must match the default network width.
///
/// # Arguments
///
/// * `model_path` - Path to trained safetensors weights
/// * `test_dir` - Directory with `<img_type>_ims` and `modal_segmasks`
/// * `img_type` - Image modality to read
/// * `device` - Compute device name (cpu, cuda, metal)
/// * `detection_threshold` - Optional override of the stored threshold
pub fn prepare_real_image_test<P: AsRef<Path>, Q: AsRef<Path>>(
    model_path: P,
    test_dir: Q,
    img_type: ImageType,
    device: &str,
    detection_threshold: Option<f32>,
    verbose: bool,
) -> Result<(ClutterConfig, SegmentationModel, RealImageDataset), ClutterError> {
    let model_path = model_path.as_ref();
    let sidecar = sidecar_path(model_path);

    let mut config = if sidecar.is_file() {
        ClutterConfig::open(&sidecar)?
    } else {
        progress_log(
            &format!(
                "No {} hyperparameters found next to weights. Using defaults.",
                constant::MODEL_CONFIG_EXTENSION
            ),
            verbose,
        );
        ClutterConfig::default()
    };

    if let Some(threshold) = detection_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ClutterError::SchemaError(
                "detection_threshold must be within [0, 1]".to_string(),
            ));
        }
        config.detection_threshold = threshold;
    }

    let model =
        SegmentationModel::load(model_path, config.clone(), select_device(device)?, verbose)?;

    let mut dataset = RealImageDataset::new(test_dir, img_type);
    dataset.load(constant::VALIDATION_SPLIT)?;
    dataset.prepare()?;

    progress_log(
        &format!("Loaded {} real test images.", dataset.len()),
        verbose,
    );

    Ok((config, model, dataset))
}
