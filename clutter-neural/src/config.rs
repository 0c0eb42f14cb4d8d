// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use clutter_core::error::ClutterError;
use clutter_core::io::write_json;
use clutter_core::ut::track::progress_log;

/// Hyperparameters shared by training and inference
///
/// Written next to trained weights so a benchmark rebuilds the same network
/// and applies the same normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClutterConfig {
    pub name: String,

    /// Mean input intensity per channel in 8-bit units
    pub mean_pixel: Vec<f32>,

    pub learning_rate: f64,
    pub weight_decay: f64,

    /// Width of every hidden convolution
    pub hidden_channels: usize,

    /// Foreground probability above which a pixel belongs to an instance
    pub detection_threshold: f32,

    /// Predicted instances with fewer pixels are discarded
    pub min_instance_size: usize,
}

impl Default for ClutterConfig {
    fn default() -> Self {
        ClutterConfig {
            name: "clutter".to_string(),
            mean_pixel: vec![128.0],
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            hidden_channels: 16,
            detection_threshold: 0.5,
            min_instance_size: 4,
        }
    }
}

impl ClutterConfig {
    /// Default hyperparameters with a dataset-specific mean pixel
    ///
    /// # Examples
    ///
    /// ```
    /// use clutter_neural::config::ClutterConfig;
    ///
    /// let config = ClutterConfig::new(&[51.0, 102.0, 153.0]);
    /// assert!((config.mean_intensity() - 0.4).abs() < 1e-6);
    /// ```
    pub fn new(mean_pixel: &[f32]) -> Self {
        ClutterConfig {
            mean_pixel: mean_pixel.to_vec(),
            ..ClutterConfig::default()
        }
    }

    /// Mean pixel reduced to one grayscale intensity in [0, 1]
    pub fn mean_intensity(&self) -> f32 {
        if self.mean_pixel.is_empty() {
            return 0.0;
        }

        self.mean_pixel.iter().sum::<f32>() / (self.mean_pixel.len() as f32 * 255.0)
    }

    pub fn display(&self, verbose: bool) {
        progress_log("Configurations:", verbose);
        for (key, value) in [
            ("NAME", self.name.clone()),
            ("MEAN_PIXEL", format!("{:?}", self.mean_pixel)),
            ("LEARNING_RATE", self.learning_rate.to_string()),
            ("WEIGHT_DECAY", self.weight_decay.to_string()),
            ("HIDDEN_CHANNELS", self.hidden_channels.to_string()),
            ("DETECTION_THRESHOLD", self.detection_threshold.to_string()),
            ("MIN_INSTANCE_SIZE", self.min_instance_size.to_string()),
        ] {
            progress_log(&format!("  {:<22}{}", key, value), verbose);
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<ClutterConfig, ClutterError> {
        let path = path.as_ref();

        let file = File::open(path)
            .map_err(|_| ClutterError::NoFileError(path.display().to_string()))?;

        serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            ClutterError::ModelError(format!("{}: {}", path.display(), err))
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClutterError> {
        write_json(self, path)
    }
}
