// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::PathBuf;

use clutter_core::config::TrainConfig;
use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::io::write_table;
use clutter_core::ut::path::mkdir_if_missing;
use clutter_core::ut::track::progress_log;
use clutter_data::data::{Dataset, SimImageDataset};
use clutter_data::get_model_dir;
use clutter_neural::config::ClutterConfig;
use clutter_neural::model::{ModelFactory, loss_table};

fn prepared_split(config: &TrainConfig, split: &str) -> Result<SimImageDataset, ClutterError> {
    let mut dataset = SimImageDataset::new(&config.base_path, config.img_type);
    dataset.load(split)?;
    dataset.prepare()?;
    Ok(dataset)
}

/// Train a model on the synthetic dataset and save its weights
///
/// Weights are written to `<model_dir>/clutter_model.safetensors` with a
/// JSON hyperparameter sidecar and a per-epoch loss table next to them.
/// Returns the weights path.
pub fn train(
    config: &TrainConfig,
    factory: &dyn ModelFactory,
    verbose: bool,
) -> Result<PathBuf, ClutterError> {
    if config.epochs == 0 {
        return Err(ClutterError::SchemaError(
            "epochs must be at least 1".to_string(),
        ));
    }

    let mut hyperparams = ClutterConfig::new(&config.mean_pixel);
    if let Some(learning_rate) = config.learning_rate {
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(ClutterError::SchemaError(
                "learning_rate must be a positive number".to_string(),
            ));
        }
        hyperparams.learning_rate = learning_rate;
    }

    hyperparams.display(verbose);

    let train_dataset = prepared_split(config, constant::TRAIN_SPLIT)?;
    let val_dataset = prepared_split(config, constant::VALIDATION_SPLIT)?;

    progress_log(
        &format!(
            "Training on {} images, validating on {}.",
            train_dataset.len(),
            val_dataset.len()
        ),
        verbose,
    );

    let mut model = factory.get_model(config, &hyperparams, verbose)?;

    let history = model.train(
        &train_dataset,
        &val_dataset,
        hyperparams.learning_rate,
        config.epochs,
        config.layers,
    )?;

    let model_dir = mkdir_if_missing(config.model_dir.clone().unwrap_or_else(get_model_dir))?;
    let weights = model_dir.join(constant::MODEL_WEIGHTS_FILE);
    model.save(&weights)?;

    if !history.is_empty() {
        write_table(
            &mut loss_table(&history)?,
            model_dir.join(constant::MODEL_LOSSES_FILE),
        )?;
    }

    progress_log(
        &format!("Saved model weights to {}.", weights.display()),
        verbose,
    );

    Ok(weights)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use image::{GrayImage, ImageBuffer, Luma};

    use clutter_core::config::{ImageType, Layers};
    use clutter_core::im::{ClutterImage, Instance};
    use clutter_data::indices::write_indices;
    use clutter_neural::model::{EpochLoss, Segmenter};

    #[derive(Debug, Default)]
    struct Calls {
        train_len: usize,
        val_len: usize,
        learning_rate: f64,
        epochs: usize,
        layers: Option<Layers>,
        saved: Option<PathBuf>,
    }

    struct FakeModel {
        config: ClutterConfig,
        calls: Rc<RefCell<Calls>>,
    }

    impl Segmenter for FakeModel {
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
            let mut calls = self.calls.borrow_mut();
            calls.train_len = train.len();
            calls.val_len = val.len();
            calls.learning_rate = learning_rate;
            calls.epochs = epochs;
            calls.layers = Some(layers);

            Ok((1..=epochs)
                .map(|epoch| EpochLoss {
                    epoch,
                    train_loss: 1.0 / epoch as f32,
                    val_loss: None,
                })
                .collect())
        }

        fn predict(&self, _: &ClutterImage) -> Result<Vec<Instance>, ClutterError> {
            Ok(vec![])
        }

        fn save(&self, weights: &Path) -> Result<PathBuf, ClutterError> {
            std::fs::write(weights, b"weights").unwrap();
            self.calls.borrow_mut().saved = Some(weights.to_path_buf());
            Ok(weights.with_extension("json"))
        }
    }

    struct FakeFactory {
        calls: Rc<RefCell<Calls>>,
    }

    impl ModelFactory for FakeFactory {
        fn get_model(
            &self,
            _: &TrainConfig,
            hyperparams: &ClutterConfig,
            _: bool,
        ) -> Result<Box<dyn Segmenter>, ClutterError> {
            Ok(Box::new(FakeModel {
                config: hyperparams.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    fn sim_dataset(name: &str) -> PathBuf {
        let base = std::env::temp_dir().join(format!("CLUTTER_TEST_TRAIN_{}", name));
        let _ = std::fs::remove_dir_all(&base);

        let images = base.join("depth_ims");
        let masks = base.join("modal_segmasks");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&masks).unwrap();

        for index in 0..3u64 {
            let name = SimImageDataset::file_name(index);
            GrayImage::new(4, 4).save(images.join(&name)).unwrap();
            let mask: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(4, 4);
            mask.save(masks.join(&name)).unwrap();
        }

        write_indices(base.join("train_indices.npy"), &[0, 1]).unwrap();
        write_indices(base.join("test_indices.npy"), &[2]).unwrap();
        base
    }

    fn config(base: &Path) -> TrainConfig {
        TrainConfig {
            base_path: base.to_path_buf(),
            mean_pixel: vec![128.0],
            img_type: ImageType::Depth,
            model_dir: Some(base.join("models")),
            epochs: 100,
            layers: Layers::All,
            learning_rate: None,
            device: "cpu".to_string(),
        }
    }

    #[test]
    fn test_train_splits_and_saves() {
        let base = sim_dataset("SAVES");
        let calls = Rc::new(RefCell::new(Calls::default()));
        let factory = FakeFactory {
            calls: calls.clone(),
        };

        let weights = train(&config(&base), &factory, false).unwrap();

        assert_eq!(weights, base.join("models").join("clutter_model.safetensors"));
        assert!(weights.is_file());

        let calls = calls.borrow();
        assert_eq!(calls.train_len, 2);
        assert_eq!(calls.val_len, 1);
        assert_eq!(calls.epochs, 100);
        assert_eq!(calls.layers, Some(Layers::All));
        assert_eq!(calls.learning_rate, ClutterConfig::default().learning_rate);
        assert_eq!(calls.saved.as_ref(), Some(&weights));

        let losses =
            std::fs::read_to_string(base.join("models").join("clutter_model_losses.tsv")).unwrap();
        assert_eq!(losses.lines().count(), 101);

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_train_overrides_and_validation() {
        let base = sim_dataset("OVERRIDES");
        let calls = Rc::new(RefCell::new(Calls::default()));
        let factory = FakeFactory {
            calls: calls.clone(),
        };

        let mut overridden = config(&base);
        overridden.learning_rate = Some(0.05);
        overridden.epochs = 2;
        overridden.layers = Layers::Heads;
        train(&overridden, &factory, false).unwrap();

        assert_eq!(calls.borrow().learning_rate, 0.05);
        assert_eq!(calls.borrow().layers, Some(Layers::Heads));

        let mut invalid = config(&base);
        invalid.epochs = 0;
        assert!(train(&invalid, &factory, false).is_err());

        let mut invalid = config(&base);
        invalid.learning_rate = Some(-1.0);
        assert!(train(&invalid, &factory, false).is_err());

        let mut missing = config(&base);
        missing.base_path = base.join("nope");
        assert!(train(&missing, &factory, false).is_err());

        std::fs::remove_dir_all(&base).unwrap();
    }
}
