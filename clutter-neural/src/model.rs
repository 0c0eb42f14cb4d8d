// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Module, Tensor, Var};
use candle_nn::loss::binary_cross_entropy_with_logit;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use polars::prelude::*;
use serde::Serialize;

use clutter_core::config::{Layers, TrainConfig};
use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::im::{ClutterImage, Instance, LabelMask};
use clutter_core::ut::track::{progress_bar, progress_log};
use kdam::BarExt;
use clutter_data::data::Dataset;

use crate::config::ClutterConfig;
use crate::device::select_device;
use crate::net::{ClutterNet, HEAD_PREFIX};
use crate::preprocess::{probabilities, to_target, to_tensor};

fn model_error(err: candle_core::Error) -> ClutterError {
    ClutterError::ModelError(err.to_string())
}

/// Mean losses recorded after each training epoch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub train_loss: f32,
    pub val_loss: Option<f32>,
}

/// Tabulate a training history
pub fn loss_table(history: &[EpochLoss]) -> Result<DataFrame, ClutterError> {
    let epoch: Vec<u32> = history.iter().map(|h| h.epoch as u32).collect();
    let train: Vec<f32> = history.iter().map(|h| h.train_loss).collect();
    let val: Vec<Option<f32>> = history.iter().map(|h| h.val_loss).collect();

    DataFrame::new(vec![
        Column::new("epoch".into(), epoch),
        Column::new("train_loss".into(), train),
        Column::new("val_loss".into(), val),
    ])
    .map_err(|err| ClutterError::TableWriteError(err.to_string()))
}

/// A trainable instance segmentation model
pub trait Segmenter {
    fn config(&self) -> &ClutterConfig;

    /// Fit the model on a prepared training split, scoring a validation split
    fn train(
        &mut self,
        train: &dyn Dataset,
        val: &dyn Dataset,
        learning_rate: f64,
        epochs: usize,
        layers: Layers,
    ) -> Result<Vec<EpochLoss>, ClutterError>;

    /// Predicted instances with confidence scores
    fn predict(&self, image: &ClutterImage) -> Result<Vec<Instance>, ClutterError>;

    /// Write weights and return the path of the hyperparameter sidecar
    fn save(&self, weights: &Path) -> Result<PathBuf, ClutterError>;
}

/// Builds untrained models for the train task
pub trait ModelFactory {
    fn get_model(
        &self,
        task: &TrainConfig,
        hyperparams: &ClutterConfig,
        verbose: bool,
    ) -> Result<Box<dyn Segmenter>, ClutterError>;
}

/// Factory producing freshly initialized [`SegmentationModel`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ClutterModelFactory;

impl ModelFactory for ClutterModelFactory {
    fn get_model(
        &self,
        task: &TrainConfig,
        hyperparams: &ClutterConfig,
        verbose: bool,
    ) -> Result<Box<dyn Segmenter>, ClutterError> {
        let device = select_device(&task.device)?;
        let model = SegmentationModel::new(hyperparams.clone(), device, verbose)?;
        Ok(Box::new(model))
    }
}

/// Path of the JSON hyperparameter sidecar stored next to weights
pub fn sidecar_path(weights: &Path) -> PathBuf {
    weights.with_extension(constant::MODEL_CONFIG_EXTENSION)
}

/// Split a probability map into scored instances
///
/// Pixels at or above `threshold` are foreground, foreground is split into
/// 8-connected instances, instances smaller than `min_size` are dropped and
/// each remaining instance is scored by its mean probability.
///
/// # Examples
///
/// ```
/// use clutter_neural::model::instances_from_probabilities;
///
/// let probs = [0.9, 0.7, 0.0, 0.0, 0.0, 0.6];
/// let instances = instances_from_probabilities(3, 2, &probs, 0.5, 2).unwrap();
///
/// assert_eq!(instances.len(), 1);
/// assert!((instances[0].score - 0.8).abs() < 1e-6);
/// ```
pub fn instances_from_probabilities(
    width: u32,
    height: u32,
    probs: &[f32],
    threshold: f32,
    min_size: usize,
) -> Result<Vec<Instance>, ClutterError> {
    let foreground: Vec<bool> = probs.iter().map(|&p| p >= threshold).collect();
    let mask = LabelMask::from_foreground(width, height, &foreground)?;

    Ok(mask
        .instances()
        .into_iter()
        .filter(|instance| instance.area() >= min_size.max(1))
        .map(|mut instance| {
            let total: f32 = instance.pixels.iter().map(|&p| probs[p as usize]).sum();
            instance.score = total / instance.area() as f32;
            instance
        })
        .collect())
}

/// [`ClutterNet`] weights plus the hyperparameters needed to use them
pub struct SegmentationModel {
    varmap: VarMap,
    net: ClutterNet,
    config: ClutterConfig,
    device: Device,
    verbose: bool,
}

impl SegmentationModel {
    /// Initialize a model with random weights
    pub fn new(
        config: ClutterConfig,
        device: Device,
        verbose: bool,
    ) -> Result<SegmentationModel, ClutterError> {
        if config.hidden_channels == 0 {
            return Err(ClutterError::ModelError(
                "hidden_channels must be at least 1".to_string(),
            ));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = ClutterNet::new(vb, config.hidden_channels).map_err(model_error)?;

        Ok(SegmentationModel {
            varmap,
            net,
            config,
            device,
            verbose,
        })
    }

    /// Load trained weights written by [`Segmenter::save`]
    pub fn load<P: AsRef<Path>>(
        weights: P,
        config: ClutterConfig,
        device: Device,
        verbose: bool,
    ) -> Result<SegmentationModel, ClutterError> {
        let weights = weights.as_ref();

        if !weights.is_file() {
            return Err(ClutterError::NoFileError(weights.display().to_string()));
        }

        let mut model = SegmentationModel::new(config, device, verbose)?;
        model.varmap.load(weights).map_err(|err| {
            ClutterError::ModelError(format!("{}: {}", weights.display(), err))
        })?;

        Ok(model)
    }

    fn trainable_vars(&self, layers: Layers) -> Result<Vec<Var>, ClutterError> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| ClutterError::ModelError("Model variables are poisoned".to_string()))?;

        let mut named: Vec<(&String, &Var)> = data
            .iter()
            .filter(|(name, _)| match layers {
                Layers::All => true,
                Layers::Heads => name.starts_with(&format!("{}.", HEAD_PREFIX)),
            })
            .collect();

        named.sort_by(|a, b| a.0.cmp(b.0));

        Ok(named.into_iter().map(|(_, var)| var.clone()).collect())
    }

    fn tensors(&self, dataset: &dyn Dataset) -> Result<Vec<(Tensor, Tensor)>, ClutterError> {
        let mean = self.config.mean_intensity();

        (0..dataset.len())
            .map(|idx| {
                let image = dataset.load_image(idx)?;
                let mask = dataset.load_mask(idx)?;

                if image.width() != mask.width() || image.height() != mask.height() {
                    return Err(ClutterError::DatasetError(format!(
                        "Image and segmask sizes differ for {}",
                        dataset.sample(idx)?.id
                    )));
                }

                let input = to_tensor(&image, mean, &self.device).map_err(model_error)?;
                let target = to_target(&mask, &self.device).map_err(model_error)?;

                Ok((input, target))
            })
            .collect()
    }

    fn loss(&self, input: &Tensor, target: &Tensor) -> Result<Tensor, ClutterError> {
        let logits = self.net.forward(input).map_err(model_error)?;
        binary_cross_entropy_with_logit(&logits, target).map_err(model_error)
    }

    fn mean_loss(&self, samples: &[(Tensor, Tensor)]) -> Result<Option<f32>, ClutterError> {
        if samples.is_empty() {
            return Ok(None);
        }

        let mut total = 0.0;
        for (input, target) in samples {
            total += self
                .loss(input, target)?
                .to_scalar::<f32>()
                .map_err(model_error)?;
        }

        Ok(Some(total / samples.len() as f32))
    }
}

impl Segmenter for SegmentationModel {
    fn config(&self) -> &ClutterConfig {
        &self.config
    }

    fn train(
        &mut self,
        train: &dyn Dataset,
        val: &dyn Dataset,
        learning_rate: f64,
        epochs: usize,
        layers: Layers,
    ) -> Result<Vec<EpochLoss>, ClutterError> {
        let train_samples = self.tensors(train)?;
        let val_samples = self.tensors(val)?;

        if train_samples.is_empty() {
            return Err(ClutterError::DatasetError(
                "Training split has no samples".to_string(),
            ));
        }

        let params = ParamsAdamW {
            lr: learning_rate,
            weight_decay: self.config.weight_decay,
            ..Default::default()
        };

        let mut optimizer =
            AdamW::new(self.trainable_vars(layers)?, params).map_err(model_error)?;

        let mut pb = progress_bar(epochs, "Training", self.verbose);
        let mut history = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            let mut total = 0.0;
            for (input, target) in train_samples.iter() {
                let loss = self.loss(input, target)?;
                optimizer.backward_step(&loss).map_err(model_error)?;
                total += loss.to_scalar::<f32>().map_err(model_error)?;
            }

            history.push(EpochLoss {
                epoch: epoch + 1,
                train_loss: total / train_samples.len() as f32,
                val_loss: self.mean_loss(&val_samples)?,
            });

            pb.update(1)
                .map_err(|err| ClutterError::OtherError(err.to_string()))?;
        }

        if self.verbose {
            println!();
        }

        if let Some(last) = history.last() {
            progress_log(
                &format!(
                    "Epoch {} train loss {:.4}, validation loss {}",
                    last.epoch,
                    last.train_loss,
                    last.val_loss
                        .map(|loss| format!("{:.4}", loss))
                        .unwrap_or("n/a".to_string())
                ),
                self.verbose,
            );
        }

        Ok(history)
    }

    fn predict(&self, image: &ClutterImage) -> Result<Vec<Instance>, ClutterError> {
        let input = to_tensor(image, self.config.mean_intensity(), &self.device)
            .map_err(model_error)?;

        let logits = self.net.forward(&input).map_err(model_error)?;
        let probs = probabilities(&logits).map_err(model_error)?;

        instances_from_probabilities(
            image.width(),
            image.height(),
            &probs,
            self.config.detection_threshold,
            self.config.min_instance_size,
        )
    }

    fn save(&self, weights: &Path) -> Result<PathBuf, ClutterError> {
        self.varmap.save(weights).map_err(|err| {
            ClutterError::ModelError(format!("{}: {}", weights.display(), err))
        })?;

        let sidecar = sidecar_path(weights);
        self.config.save(&sidecar)?;

        Ok(sidecar)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clutter_core::config::ImageType;
    use clutter_data::data::SimImageDataset;
    use clutter_data::indices::write_indices;
    use image::{GrayImage, ImageBuffer, Luma};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("CLUTTER_TEST_MODEL_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn tiny_config() -> ClutterConfig {
        ClutterConfig {
            hidden_channels: 2,
            min_instance_size: 1,
            ..ClutterConfig::new(&[64.0])
        }
    }

    fn sim_dataset(base: &Path) {
        let images = base.join("depth_ims");
        let masks = base.join("modal_segmasks");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&masks).unwrap();

        for index in 0..2u64 {
            let name = SimImageDataset::file_name(index);
            let mut pixels = vec![0u8; 36];
            let mut labels = vec![0u16; 36];
            for idx in [7, 8, 13, 14] {
                pixels[idx] = 255;
                labels[idx] = 1;
            }

            GrayImage::from_raw(6, 6, pixels)
                .unwrap()
                .save(images.join(&name))
                .unwrap();

            let mask: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(6, 6, labels).unwrap();
            mask.save(masks.join(&name)).unwrap();
        }

        write_indices(base.join("train_indices.npy"), &[0]).unwrap();
        write_indices(base.join("test_indices.npy"), &[1]).unwrap();
    }

    #[test]
    fn test_instances_from_probabilities() {
        let probs = [0.9, 0.0, 0.8, 0.0, 0.0, 0.0, 0.6, 0.6, 0.0];
        let instances = instances_from_probabilities(3, 3, &probs, 0.5, 1).unwrap();
        assert_eq!(instances.len(), 3);

        let instances = instances_from_probabilities(3, 3, &probs, 0.5, 2).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].pixels, vec![6, 7]);
        assert!((instances[0].score - 0.6).abs() < 1e-6);

        assert!(instances_from_probabilities(3, 3, &probs, 0.95, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_heads_only_selects_head_vars() {
        let model = SegmentationModel::new(tiny_config(), Device::Cpu, false).unwrap();
        assert_eq!(model.trainable_vars(Layers::All).unwrap().len(), 8);
        assert_eq!(model.trainable_vars(Layers::Heads).unwrap().len(), 2);
    }

    #[test]
    fn test_train_save_load_predict() {
        let base = scratch("TRAIN");
        sim_dataset(&base);

        let mut train = SimImageDataset::new(&base, ImageType::Depth);
        train.load("train").unwrap();
        train.prepare().unwrap();

        let mut val = SimImageDataset::new(&base, ImageType::Depth);
        val.load("test").unwrap();
        val.prepare().unwrap();

        let mut model = SegmentationModel::new(tiny_config(), Device::Cpu, false).unwrap();
        let history = model.train(&train, &val, 1e-2, 2, Layers::All).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[1].epoch, 2);
        assert!(history.iter().all(|h| h.train_loss.is_finite()));
        assert!(history[0].val_loss.is_some());

        let weights = base.join(constant::MODEL_WEIGHTS_FILE);
        let sidecar = model.save(&weights).unwrap();
        assert!(weights.is_file());
        assert_eq!(sidecar, base.join("clutter_model.json"));

        let config = ClutterConfig::open(&sidecar).unwrap();
        let loaded = SegmentationModel::load(&weights, config, Device::Cpu, false).unwrap();

        let image = train.load_image(0).unwrap();
        assert_eq!(
            loaded.predict(&image).unwrap(),
            model.predict(&image).unwrap()
        );

        let table = loss_table(&history).unwrap();
        assert_eq!(table.height(), 2);

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_load_missing_weights() {
        let result = SegmentationModel::load(
            "missing.safetensors",
            tiny_config(),
            Device::Cpu,
            false,
        );
        assert!(matches!(result, Err(ClutterError::NoFileError(_))));
    }

    #[test]
    fn test_factory_rejects_unknown_device() {
        let task = TrainConfig {
            base_path: "data".into(),
            mean_pixel: vec![128.0],
            img_type: ImageType::Depth,
            model_dir: None,
            epochs: 1,
            layers: Layers::All,
            learning_rate: None,
            device: "tpu".to_string(),
        };

        assert!(ClutterModelFactory
            .get_model(&task, &tiny_config(), false)
            .is_err());
    }
}
