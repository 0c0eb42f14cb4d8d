// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constant;
use crate::error::ClutterError;

/// The closed set of tasks the dispatcher can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Task {
    Augment,
    Train,
    Benchmark,
}

impl Task {
    /// Name of the task and of its configuration section
    pub fn section(&self) -> &'static str {
        match self {
            Task::Augment => "AUGMENT",
            Task::Train => "TRAIN",
            Task::Benchmark => "BENCHMARK",
        }
    }

    pub fn iter() -> impl Iterator<Item = &'static Task> {
        static TASKS: [Task; 3] = [Task::Augment, Task::Train, Task::Benchmark];
        TASKS.iter()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.section())
    }
}

impl FromStr for Task {
    type Err = ClutterError;

    /// Match an already evaluated (unquoted, uppercase) task name
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Task::iter()
            .find(|task| task.section() == name)
            .copied()
            .ok_or_else(|| ClutterError::UnknownTaskError(name.to_string()))
    }
}

/// Image modality used to locate `<img_type>_ims` directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Depth,
    Color,
}

impl ImageType {
    /// Directory name holding images of this modality
    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageType::Depth => "depth_ims",
            ImageType::Color => "color_ims",
        }
    }
}

/// Which model variables are updated during training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layers {
    #[default]
    All,
    Heads,
}

/// Parameters of the augment task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    pub img_dir: PathBuf,
    pub out_dir: PathBuf,

    /// Number of directory entries to visit, coerced like Python's `int()`
    #[serde(deserialize_with = "integer_like")]
    pub num_imgs: usize,

    /// Standard deviation of additive gaussian noise (intensity in [0, 1])
    #[serde(default)]
    pub noise_std: f32,

    /// Fraction of pixels replaced by salt-and-pepper noise
    #[serde(default)]
    pub salt_pepper: f32,

    /// Radius of the box blur in pixels
    #[serde(default)]
    pub blur_radius: u32,

    /// Constant added to every pixel
    #[serde(default)]
    pub brightness: f32,

    /// Probability of flipping an image horizontally
    #[serde(default)]
    pub flip_probability: f32,

    #[serde(default)]
    pub seed: Option<u64>,
}

/// Parameters of the train task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub base_path: PathBuf,

    #[serde(deserialize_with = "scalar_or_list")]
    pub mean_pixel: Vec<f32>,

    pub img_type: ImageType,

    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default)]
    pub layers: Layers,

    #[serde(default)]
    pub learning_rate: Option<f64>,

    /// Compute device (cpu, cuda, metal)
    #[serde(default = "default_device")]
    pub device: String,
}

/// Parameters of the benchmark task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub output_dir: PathBuf,
    pub run_name: String,
    pub model_path: PathBuf,
    pub test_dir: PathBuf,

    #[serde(default)]
    pub img_type: ImageType,

    #[serde(default)]
    pub detection_threshold: Option<f32>,

    #[serde(default = "default_device")]
    pub device: String,
}

/// A validated configuration for exactly one task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskConfig {
    Augment(AugmentConfig),
    Train(TrainConfig),
    Benchmark(BenchmarkConfig),
}

impl TaskConfig {
    pub fn task(&self) -> Task {
        match self {
            TaskConfig::Augment(_) => Task::Augment,
            TaskConfig::Train(_) => Task::Train,
            TaskConfig::Benchmark(_) => Task::Benchmark,
        }
    }
}

fn default_epochs() -> usize {
    constant::DEFAULT_EPOCHS
}

fn default_device() -> String {
    constant::DEFAULT_DEVICE.to_string()
}

fn scalar_or_list<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScalarOrList {
        Scalar(f32),
        List(Vec<f32>),
    }

    match ScalarOrList::deserialize(deserializer)? {
        ScalarOrList::Scalar(value) => Ok(vec![value]),
        ScalarOrList::List(values) if !values.is_empty() => Ok(values),
        ScalarOrList::List(_) => Err(serde::de::Error::custom(
            "mean_pixel must contain at least one value",
        )),
    }
}

/// Accept an int, a bool, a float (truncated toward zero) or an integer string
fn integer_like<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntegerLike {
        Int(u64),
        Bool(bool),
        Float(f64),
        Text(String),
    }

    let invalid = |found: String| -> D::Error {
        serde::de::Error::custom(format!("expected a non-negative integer, found {}", found))
    };

    match IntegerLike::deserialize(deserializer)? {
        IntegerLike::Int(value) => usize::try_from(value).map_err(|_| invalid(value.to_string())),
        IntegerLike::Bool(value) => Ok(usize::from(value)),
        IntegerLike::Float(value) if value.is_finite() && value.trunc() >= 0.0 => {
            Ok(value.trunc() as usize)
        }
        IntegerLike::Float(value) => Err(invalid(value.to_string())),
        IntegerLike::Text(text) => text
            .trim()
            .replace('_', "")
            .parse::<usize>()
            .map_err(|_| invalid(format!("'{}'", text))),
    }
}
