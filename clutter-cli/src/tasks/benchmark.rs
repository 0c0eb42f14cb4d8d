// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::PathBuf;

use clutter_core::config::BenchmarkConfig;
use clutter_core::error::ClutterError;
use clutter_core::io::write_json;
use clutter_core::ut::path::mkdir_if_missing;
use clutter_core::ut::track::progress_log;
use clutter_data::data::Dataset;
use clutter_neural::bench::Benchmark;
use clutter_neural::config::ClutterConfig;
use clutter_neural::model::Segmenter;

/// Inference settings, model and prepared dataset used by a benchmark run
pub type RealImageTest = (ClutterConfig, Box<dyn Segmenter>, Box<dyn Dataset>);

/// Evaluate a trained model on real images
///
/// Creates `<output_dir>/<run_name>` (reusing it when present), records the
/// task configuration as `config.json`, then runs every benchmark against
/// the same model and dataset. Returns the run directory.
pub fn benchmark<F>(
    config: &BenchmarkConfig,
    prepare: F,
    benchmarks: &[Box<dyn Benchmark>],
    verbose: bool,
) -> Result<PathBuf, ClutterError>
where
    F: FnOnce(&BenchmarkConfig) -> Result<RealImageTest, ClutterError>,
{
    if config.run_name.trim().is_empty() {
        return Err(ClutterError::SchemaError(
            "run_name must not be empty".to_string(),
        ));
    }

    progress_log("Benchmarking model.", verbose);

    let run_dir = mkdir_if_missing(config.output_dir.join(&config.run_name))?;
    write_json(config, run_dir.join("config.json"))?;

    let (inference_config, model, dataset) = prepare(config)?;

    for bench in benchmarks {
        bench.run(&run_dir, &inference_config, model.as_ref(), dataset.as_ref())?;
    }

    progress_log(
        &format!("Saved benchmarking output to {}.", run_dir.display()),
        verbose,
    );

    Ok(run_dir)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use clutter_core::config::{ImageType, Layers};
    use clutter_core::im::{ClutterImage, Instance};
    use clutter_data::data::RealImageDataset;
    use clutter_neural::model::EpochLoss;

    struct NullModel(ClutterConfig);

    impl Segmenter for NullModel {
        fn config(&self) -> &ClutterConfig {
            &self.0
        }

        fn train(
            &mut self,
            _: &dyn Dataset,
            _: &dyn Dataset,
            _: f64,
            _: usize,
            _: Layers,
        ) -> Result<Vec<EpochLoss>, ClutterError> {
            Ok(vec![])
        }

        fn predict(&self, _: &ClutterImage) -> Result<Vec<Instance>, ClutterError> {
            Ok(vec![])
        }

        fn save(&self, weights: &Path) -> Result<PathBuf, ClutterError> {
            Ok(weights.to_path_buf())
        }
    }

    /// Records the run directory it was given
    struct Recorder {
        name: &'static str,
        runs: Rc<RefCell<Vec<(&'static str, PathBuf)>>>,
    }

    impl Benchmark for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(
            &self,
            run_dir: &Path,
            _: &ClutterConfig,
            _: &dyn Segmenter,
            _: &dyn Dataset,
        ) -> Result<PathBuf, ClutterError> {
            assert!(run_dir.is_dir());
            self.runs.borrow_mut().push((self.name, run_dir.to_path_buf()));
            Ok(run_dir.join(self.name))
        }
    }

    fn config(base: &Path) -> BenchmarkConfig {
        BenchmarkConfig {
            output_dir: base.join("outputs"),
            run_name: "run_1".to_string(),
            model_path: base.join("clutter_model.safetensors"),
            test_dir: base.join("real"),
            img_type: ImageType::Depth,
            detection_threshold: None,
            device: "cpu".to_string(),
        }
    }

    fn fake_test(config: &BenchmarkConfig) -> Result<RealImageTest, ClutterError> {
        Ok((
            ClutterConfig::default(),
            Box::new(NullModel(ClutterConfig::default())),
            Box::new(RealImageDataset::new(&config.test_dir, config.img_type)),
        ))
    }

    fn recorders(runs: &Rc<RefCell<Vec<(&'static str, PathBuf)>>>) -> Vec<Box<dyn Benchmark>> {
        vec![
            Box::new(Recorder {
                name: "coco",
                runs: runs.clone(),
            }),
            Box::new(Recorder {
                name: "saurabh",
                runs: runs.clone(),
            }),
        ]
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("CLUTTER_TEST_BENCHMARK_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_run_dir_shared_by_benchmarks() {
        let base = scratch("SHARED");
        let runs = Rc::new(RefCell::new(vec![]));

        let run_dir = benchmark(&config(&base), fake_test, &recorders(&runs), false).unwrap();

        assert_eq!(run_dir, base.join("outputs").join("run_1"));
        assert!(run_dir.join("config.json").is_file());

        let runs = runs.borrow();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], ("coco", run_dir.clone()));
        assert_eq!(runs[1], ("saurabh", run_dir.clone()));

        let entries = std::fs::read_dir(base.join("outputs")).unwrap().count();
        assert_eq!(entries, 1);

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_rerun_same_name() {
        let base = scratch("RERUN");
        let runs = Rc::new(RefCell::new(vec![]));

        let first = benchmark(&config(&base), fake_test, &recorders(&runs), false).unwrap();
        let second = benchmark(&config(&base), fake_test, &recorders(&runs), false).unwrap();

        assert_eq!(first, second);
        assert_eq!(runs.borrow().len(), 4);

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_failures() {
        let base = scratch("FAILURES");
        let runs = Rc::new(RefCell::new(vec![]));

        let mut empty = config(&base);
        empty.run_name = " ".to_string();
        assert!(benchmark(&empty, fake_test, &recorders(&runs), false).is_err());

        // Output path blocked by a regular file
        std::fs::write(base.join("outputs"), "file").unwrap();
        assert!(matches!(
            benchmark(&config(&base), fake_test, &recorders(&runs), false),
            Err(ClutterError::DirError(_))
        ));

        std::fs::remove_file(base.join("outputs")).unwrap();
        let failing = |_: &BenchmarkConfig| -> Result<RealImageTest, ClutterError> {
            Err(ClutterError::NoFileError("clutter_model.safetensors".to_string()))
        };
        assert!(benchmark(&config(&base), failing, &recorders(&runs), false).is_err());
        assert!(runs.borrow().is_empty());

        std::fs::remove_dir_all(&base).unwrap();
    }
}
