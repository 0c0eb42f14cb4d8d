// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::io::{write_json, write_table};
use clutter_core::ut::track::progress_log;
use clutter_data::data::Dataset;

use crate::bench::matching::greedy_match;
use crate::bench::{Benchmark, ImageResult, output_dir, predict_dataset};
use crate::config::ClutterConfig;
use crate::model::Segmenter;

/// Precision and recall summary at one IoU threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdScore {
    pub iou: f32,
    pub ap: Option<f32>,
    pub recall: Option<f32>,
}

/// COCO-style mask evaluation summary
///
/// Scores are `None` when the test set has no ground truth instances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CocoSummary {
    pub images: usize,
    pub ground_truth: usize,
    pub predictions: usize,
    pub ap: Option<f32>,
    pub ap50: Option<f32>,
    pub ap75: Option<f32>,
    pub ar: Option<f32>,
    pub thresholds: Vec<ThresholdScore>,
}

/// Interpolated average precision from score-ranked true positive flags
///
/// Precision is made monotonically non-increasing in recall, then sampled
/// at `COCO_RECALL_POINTS` evenly spaced recall levels.
///
/// # Examples
///
/// ```
/// use clutter_neural::bench::average_precision;
///
/// assert_eq!(average_precision(&[true, true], 2), Some(1.0));
/// assert_eq!(average_precision(&[], 0), None);
/// assert_eq!(average_precision(&[false], 1), Some(0.0));
/// ```
pub fn average_precision(ranked_hits: &[bool], n_ground_truth: usize) -> Option<f32> {
    if n_ground_truth == 0 {
        return None;
    }

    let mut precision = Vec::with_capacity(ranked_hits.len());
    let mut recall = Vec::with_capacity(ranked_hits.len());
    let mut tp = 0usize;

    for (rank, &hit) in ranked_hits.iter().enumerate() {
        if hit {
            tp += 1;
        }
        precision.push(tp as f32 / (rank + 1) as f32);
        recall.push(tp as f32 / n_ground_truth as f32);
    }

    for idx in (1..precision.len()).rev() {
        if precision[idx] > precision[idx - 1] {
            precision[idx - 1] = precision[idx];
        }
    }

    let points = constant::COCO_RECALL_POINTS;
    let total: f32 = (0..points)
        .map(|point| {
            let level = point as f32 / (points - 1) as f32;
            recall
                .iter()
                .position(|&r| r >= level - 1e-6)
                .map(|idx| precision[idx])
                .unwrap_or(0.0)
        })
        .sum();

    Some(total / points as f32)
}

fn score_threshold(results: &[ImageResult], iou: f32) -> (ThresholdScore, Vec<usize>) {
    let mut ranked: Vec<(f32, bool)> = vec![];
    let mut matched_per_image = Vec::with_capacity(results.len());

    for result in results {
        let predictions = result.ranked_predictions();
        let matches = greedy_match(&predictions, &result.ground_truth, iou);

        matched_per_image.push(matches.iter().filter(|m| m.is_some()).count());
        ranked.extend(
            predictions
                .iter()
                .zip(matches.iter())
                .map(|(prediction, matched)| (prediction.score, matched.is_some())),
        );
    }

    // Stable sort keeps per-image order among equal scores
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let hits: Vec<bool> = ranked.iter().map(|(_, hit)| *hit).collect();
    let n_ground_truth: usize = results.iter().map(|r| r.ground_truth.len()).sum();
    let matched: usize = matched_per_image.iter().sum();

    let score = ThresholdScore {
        iou,
        ap: average_precision(&hits, n_ground_truth),
        recall: (n_ground_truth > 0).then(|| matched as f32 / n_ground_truth as f32),
    };

    (score, matched_per_image)
}

fn mean(values: impl Iterator<Item = Option<f32>>) -> Option<f32> {
    let values: Option<Vec<f32>> = values.collect();
    values
        .filter(|v| !v.is_empty())
        .map(|v| v.iter().sum::<f32>() / v.len() as f32)
}

/// Summarize predictions over all COCO IoU thresholds
pub fn coco_summary(results: &[ImageResult]) -> (CocoSummary, Vec<usize>) {
    let mut thresholds = Vec::with_capacity(constant::COCO_IOU_THRESHOLDS.len());
    let mut matched_50 = vec![0; results.len()];

    for &iou in constant::COCO_IOU_THRESHOLDS.iter() {
        let (score, matched) = score_threshold(results, iou);
        if iou == constant::COCO_IOU_THRESHOLDS[0] {
            matched_50 = matched;
        }
        thresholds.push(score);
    }

    let at = |target: f32| {
        thresholds
            .iter()
            .find(|t| (t.iou - target).abs() < 1e-6)
            .and_then(|t| t.ap)
    };

    let summary = CocoSummary {
        images: results.len(),
        ground_truth: results.iter().map(|r| r.ground_truth.len()).sum(),
        predictions: results.iter().map(|r| r.predictions.len()).sum(),
        ap: mean(thresholds.iter().map(|t| t.ap)),
        ap50: at(0.5),
        ap75: at(0.75),
        ar: mean(thresholds.iter().map(|t| t.recall)),
        thresholds,
    };

    (summary, matched_50)
}

/// Best IoU of every ground truth instance averaged over the image
fn mean_best_iou(result: &ImageResult) -> Option<f32> {
    if result.ground_truth.is_empty() {
        return None;
    }

    let total: f32 = result
        .ground_truth
        .iter()
        .map(|gt| {
            result
                .predictions
                .iter()
                .map(|p| p.iou(gt))
                .fold(0.0, f32::max)
        })
        .sum();

    Some(total / result.ground_truth.len() as f32)
}

fn per_image_table(
    results: &[ImageResult],
    matched_50: &[usize],
) -> Result<DataFrame, ClutterError> {
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    let gt: Vec<u32> = results.iter().map(|r| r.ground_truth.len() as u32).collect();
    let pred: Vec<u32> = results.iter().map(|r| r.predictions.len() as u32).collect();
    let matched: Vec<u32> = matched_50.iter().map(|&m| m as u32).collect();
    let best: Vec<Option<f32>> = results.iter().map(mean_best_iou).collect();

    DataFrame::new(vec![
        Column::new("image_id".into(), ids),
        Column::new("ground_truth".into(), gt),
        Column::new("predictions".into(), pred),
        Column::new("matched_50".into(), matched),
        Column::new("mean_best_iou".into(), best),
    ])
    .map_err(|err| ClutterError::BenchmarkError(err.to_string()))
}

/// COCO-style mask AP/AR over IoU thresholds 0.50:0.05:0.95
#[derive(Debug, Clone, Copy, Default)]
pub struct CocoBenchmark {
    pub verbose: bool,
}

impl Benchmark for CocoBenchmark {
    fn name(&self) -> &'static str {
        "coco"
    }

    fn run(
        &self,
        run_dir: &Path,
        _config: &ClutterConfig,
        model: &dyn Segmenter,
        dataset: &dyn Dataset,
    ) -> Result<PathBuf, ClutterError> {
        let output = output_dir(run_dir, self.name())?;

        let results = predict_dataset(model, dataset, "COCO benchmark", self.verbose)?;
        let (summary, matched_50) = coco_summary(&results);

        write_json(&summary, output.join("summary.json"))?;
        write_table(
            &mut per_image_table(&results, &matched_50)?,
            output.join("per_image.tsv"),
        )?;

        let format = |v: Option<f32>| v.map(|v| format!("{:.3}", v)).unwrap_or("n/a".into());
        progress_log(
            &format!(
                "COCO AP {} | AP50 {} | AP75 {} | AR {}",
                format(summary.ap),
                format(summary.ap50),
                format(summary.ap75),
                format(summary.ar)
            ),
            self.verbose,
        );

        Ok(output)
    }
}

/// Run the COCO benchmark and write `coco/` under the run directory
pub fn coco_benchmark(
    run_dir: &Path,
    config: &ClutterConfig,
    model: &dyn Segmenter,
    dataset: &dyn Dataset,
    verbose: bool,
) -> Result<PathBuf, ClutterError> {
    CocoBenchmark { verbose }.run(run_dir, config, model, dataset)
}
