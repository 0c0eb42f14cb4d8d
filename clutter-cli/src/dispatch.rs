// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use clutter_core::augment::{Augmenter, NoiseAugmenter};
use clutter_core::config::{AugmentConfig, BenchmarkConfig, Config, TaskConfig};
use clutter_core::error::ClutterError;
use clutter_core::ut::track::progress_log;
use clutter_data::data::Dataset;
use clutter_neural::bench::{Benchmark, CocoBenchmark, SaurabhBenchmark};
use clutter_neural::model::{ClutterModelFactory, ModelFactory, Segmenter};
use clutter_neural::real::prepare_real_image_test;

use crate::tasks::benchmark::RealImageTest;
use crate::tasks::{augment_data, benchmark, train};

/// Builds the augmenter used by the augment task
pub type AugmenterFactory =
    Box<dyn Fn(&AugmentConfig) -> Result<Box<dyn Augmenter>, ClutterError>>;

/// Loads inference settings, model and test set for the benchmark task
pub type RealImageTestLoader =
    Box<dyn Fn(&BenchmarkConfig, bool) -> Result<RealImageTest, ClutterError>>;

/// External capabilities the tasks depend on
pub struct Ports {
    pub augmenter: AugmenterFactory,
    pub model_factory: Box<dyn ModelFactory>,
    pub real_image_test: RealImageTestLoader,
    pub benchmarks: Vec<Box<dyn Benchmark>>,
}

impl Ports {
    /// Noise augmentation, the convolutional segmenter and both benchmarks
    pub fn new(verbose: bool) -> Self {
        Ports {
            augmenter: Box::new(noise_augmenter),
            model_factory: Box::new(ClutterModelFactory),
            real_image_test: Box::new(load_real_image_test),
            benchmarks: vec![
                Box::new(CocoBenchmark { verbose }),
                Box::new(SaurabhBenchmark { verbose }),
            ],
        }
    }
}

fn noise_augmenter(config: &AugmentConfig) -> Result<Box<dyn Augmenter>, ClutterError> {
    Ok(Box::new(NoiseAugmenter::new(config)?))
}

fn load_real_image_test(
    config: &BenchmarkConfig,
    verbose: bool,
) -> Result<RealImageTest, ClutterError> {
    let (inference_config, model, dataset) = prepare_real_image_test(
        &config.model_path,
        &config.test_dir,
        config.img_type,
        &config.device,
        config.detection_threshold,
        verbose,
    )?;

    let model: Box<dyn Segmenter> = Box::new(model);
    let dataset: Box<dyn Dataset> = Box::new(dataset);

    Ok((inference_config, model, dataset))
}

/// What a completed task produced
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Number of augmented images written
    Augmented(usize),
    /// Path of the saved weights
    Trained(PathBuf),
    /// Path of the benchmark run directory
    Benchmarked(PathBuf),
}

/// Validate the task section and run exactly one task
pub fn dispatch(config: &Config, ports: &Ports) -> Result<TaskOutcome, ClutterError> {
    let verbose = config.verbose;
    progress_log(&format!("Running task {}.", config.task), verbose);

    match config.task_config()? {
        TaskConfig::Augment(task) => {
            let mut augmenter = (ports.augmenter)(&task)?;
            augment_data(&task, augmenter.as_mut(), verbose).map(TaskOutcome::Augmented)
        }
        TaskConfig::Train(task) => {
            train(&task, ports.model_factory.as_ref(), verbose).map(TaskOutcome::Trained)
        }
        TaskConfig::Benchmark(task) => benchmark(
            &task,
            |config| (ports.real_image_test)(config, verbose),
            &ports.benchmarks,
            verbose,
        )
        .map(TaskOutcome::Benchmarked),
    }
}

/// Read a configuration file and run its task with the default ports
pub fn run<P: AsRef<Path>>(path: P) -> Result<TaskOutcome, ClutterError> {
    let config = Config::open(path)?;
    let ports = Ports::new(config.verbose);
    dispatch(&config, &ports)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use clutter_core::im::ClutterImage;
    use clutter_neural::config::ClutterConfig;

    struct Identity;

    impl Augmenter for Identity {
        fn augment(&mut self, image: &ClutterImage) -> Result<ClutterImage, ClutterError> {
            Ok(image.clone())
        }
    }

    struct Unused;

    impl ModelFactory for Unused {
        fn get_model(
            &self,
            _: &clutter_core::config::TrainConfig,
            _: &ClutterConfig,
            _: bool,
        ) -> Result<Box<dyn Segmenter>, ClutterError> {
            Err(ClutterError::ModelError("not available".to_string()))
        }
    }

    /// Ports that count augmenter and loader calls
    fn fake_ports(augments: Rc<Cell<usize>>, loads: Rc<Cell<usize>>) -> Ports {
        Ports {
            augmenter: Box::new(
                move |_: &AugmentConfig| -> Result<Box<dyn Augmenter>, ClutterError> {
                    augments.set(augments.get() + 1);
                    Ok(Box::new(Identity))
                },
            ),
            model_factory: Box::new(Unused),
            real_image_test: Box::new(
                move |config: &BenchmarkConfig, _: bool| -> Result<RealImageTest, ClutterError> {
                    loads.set(loads.get() + 1);
                    Err(ClutterError::NoFileError(
                        config.model_path.display().to_string(),
                    ))
                },
            ),
            benchmarks: vec![],
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("CLUTTER_TEST_DISPATCH_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_dispatch_augment() {
        let base = scratch("AUGMENT");
        std::fs::create_dir_all(base.join("in")).unwrap();

        let text = format!(
            "[GENERAL]\ntask = 'augment'\nverbose = False\n\n[AUGMENT]\nimg_dir = '{}'\nout_dir = '{}'\nnum_imgs = 10\n",
            base.join("in").display(),
            base.join("out").display()
        );

        let augments = Rc::new(Cell::new(0));
        let loads = Rc::new(Cell::new(0));
        let ports = fake_ports(augments.clone(), loads.clone());

        let outcome = dispatch(&Config::parse(&text).unwrap(), &ports).unwrap();

        assert_eq!(outcome, TaskOutcome::Augmented(0));
        assert_eq!(augments.get(), 1);
        assert_eq!(loads.get(), 0);
        assert!(base.join("out").is_dir());

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_dispatch_benchmark_only() {
        let base = scratch("BENCHMARK");

        let text = format!(
            "[GENERAL]\ntask = \"BENCHMARK\"\nverbose = False\n\n[BENCHMARK]\noutput_dir = '{}'\nrun_name = 'run'\nmodel_path = 'model.safetensors'\ntest_dir = 'real'\n",
            base.display()
        );

        let augments = Rc::new(Cell::new(0));
        let loads = Rc::new(Cell::new(0));
        let ports = fake_ports(augments.clone(), loads.clone());

        let result = dispatch(&Config::parse(&text).unwrap(), &ports);

        assert!(matches!(result, Err(ClutterError::NoFileError(_))));
        assert_eq!(loads.get(), 1);
        assert_eq!(augments.get(), 0);
        assert!(base.join("run").is_dir());

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_dispatch_schema_error() {
        let text = "[GENERAL]\ntask = 'train'\nverbose = False\n\n[TRAIN]\nbase_path = 'data'\n";

        let ports = fake_ports(Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let result = dispatch(&Config::parse(text).unwrap(), &ports);

        assert!(matches!(result, Err(ClutterError::SchemaError(_))));
    }

    #[test]
    fn test_default_ports() {
        let ports = Ports::new(false);
        let names: Vec<&str> = ports.benchmarks.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["coco", "saurabh"]);
    }

    #[test]
    fn test_run_missing_file() {
        assert!(matches!(
            run("missing_config.ini"),
            Err(ClutterError::NoFileError(_))
        ));
    }
}
