// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

mod coco;
mod matching;
mod saurabh;

pub use coco::{CocoBenchmark, CocoSummary, average_precision, coco_benchmark, coco_summary};
pub use matching::greedy_match;
pub use saurabh::{PrPoint, SaurabhBenchmark, pr_curve, s_benchmark};

use std::path::{Path, PathBuf};

use clutter_core::error::ClutterError;
use clutter_core::im::Instance;
use clutter_core::ut::path::mkdir_if_missing;
use clutter_core::ut::track::progress_bar;
use kdam::BarExt;
use clutter_data::data::Dataset;

use crate::config::ClutterConfig;
use crate::model::Segmenter;

/// An evaluation that writes its artifacts under a run directory
pub trait Benchmark {
    /// Subdirectory of the run directory holding this benchmark's output
    fn name(&self) -> &'static str;

    fn run(
        &self,
        run_dir: &Path,
        config: &ClutterConfig,
        model: &dyn Segmenter,
        dataset: &dyn Dataset,
    ) -> Result<PathBuf, ClutterError>;
}

/// Ground truth and predicted instances of one test image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub id: String,
    pub ground_truth: Vec<Instance>,
    pub predictions: Vec<Instance>,
}

impl ImageResult {
    /// Predictions ordered by descending score, ties kept in input order
    pub fn ranked_predictions(&self) -> Vec<&Instance> {
        let mut ranked: Vec<&Instance> = self.predictions.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Run inference over every image of a prepared dataset
pub fn predict_dataset(
    model: &dyn Segmenter,
    dataset: &dyn Dataset,
    desc: &str,
    verbose: bool,
) -> Result<Vec<ImageResult>, ClutterError> {
    let mut pb = progress_bar(dataset.len(), desc, verbose);
    let mut results = Vec::with_capacity(dataset.len());

    for idx in 0..dataset.len() {
        let image = dataset.load_image(idx)?;
        let mask = dataset.load_mask(idx)?;

        if image.width() != mask.width() || image.height() != mask.height() {
            return Err(ClutterError::BenchmarkError(format!(
                "Image and segmask sizes differ for {}",
                dataset.sample(idx)?.id
            )));
        }

        results.push(ImageResult {
            id: dataset.sample(idx)?.id.clone(),
            ground_truth: mask.instances(),
            predictions: model.predict(&image)?,
        });

        pb.update(1)
            .map_err(|err| ClutterError::OtherError(err.to_string()))?;
    }

    if verbose {
        println!();
    }

    Ok(results)
}

/// Create `<run_dir>/<name>` for a benchmark's artifacts
fn output_dir(run_dir: &Path, name: &str) -> Result<PathBuf, ClutterError> {
    mkdir_if_missing(run_dir.join(name))
}
