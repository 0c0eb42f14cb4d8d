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

/// Pixel-weighted precision and recall at one score threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrPoint {
    pub score_threshold: f32,
    pub precision: f32,
    pub recall: Option<f32>,
    pub predictions: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaurabhSummary {
    pub images: usize,
    pub match_iou: f32,
    pub auc: Option<f32>,
    pub best_f1: Option<f32>,
    pub best_score_threshold: Option<f32>,
}

/// Sweep score thresholds and measure pixel-weighted precision and recall
///
/// At each threshold, predictions with a lower score are dropped and the
/// rest are greedily matched to ground truth at `SAURABH_MATCH_IOU`.
/// Precision is the share of predicted pixels belonging to matched
/// predictions. Recall is the share of ground truth pixels belonging to
/// matched instances. Precision is 1 when nothing is predicted and recall
/// is `None` without ground truth.
pub fn pr_curve(results: &[ImageResult]) -> Vec<PrPoint> {
    let steps = constant::SAURABH_SCORE_STEPS;

    let gt_pixels: usize = results
        .iter()
        .flat_map(|r| r.ground_truth.iter())
        .map(|gt| gt.area())
        .sum();

    (0..steps)
        .map(|step| {
            let threshold = step as f32 / (steps - 1) as f32;

            let mut predicted_pixels = 0;
            let mut matched_pixels = 0;
            let mut recalled_pixels = 0;
            let mut predictions = 0;
            let mut matched = 0;

            for result in results {
                let kept: Vec<_> = result
                    .ranked_predictions()
                    .into_iter()
                    .filter(|p| p.score >= threshold)
                    .collect();

                let matches =
                    greedy_match(&kept, &result.ground_truth, constant::SAURABH_MATCH_IOU);

                for (prediction, gt) in kept.iter().zip(matches.iter()) {
                    predictions += 1;
                    predicted_pixels += prediction.area();

                    if let Some(gt) = gt {
                        matched += 1;
                        matched_pixels += prediction.area();
                        recalled_pixels += result.ground_truth[*gt].area();
                    }
                }
            }

            PrPoint {
                score_threshold: threshold,
                precision: if predicted_pixels == 0 {
                    1.0
                } else {
                    matched_pixels as f32 / predicted_pixels as f32
                },
                recall: (gt_pixels > 0).then(|| recalled_pixels as f32 / gt_pixels as f32),
                predictions,
                matched,
            }
        })
        .collect()
}

/// Trapezoidal area under the precision-recall curve
fn area_under_curve(curve: &[PrPoint]) -> Option<f32> {
    let mut points: Vec<(f32, f32)> = curve
        .iter()
        .filter_map(|p| p.recall.map(|r| (r, p.precision)))
        .collect();

    if points.is_empty() {
        return None;
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.total_cmp(&a.1)));

    Some(
        points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum(),
    )
}

fn summarize(results: &[ImageResult], curve: &[PrPoint]) -> SaurabhSummary {
    let best = curve
        .iter()
        .filter_map(|p| {
            let recall = p.recall?;
            let total = p.precision + recall;
            (total > 0.0).then(|| (2.0 * p.precision * recall / total, p.score_threshold))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0));

    SaurabhSummary {
        images: results.len(),
        match_iou: constant::SAURABH_MATCH_IOU,
        auc: area_under_curve(curve),
        best_f1: best.map(|(f1, _)| f1),
        best_score_threshold: best.map(|(_, threshold)| threshold),
    }
}

fn curve_table(curve: &[PrPoint]) -> Result<DataFrame, ClutterError> {
    DataFrame::new(vec![
        Column::new(
            "score_threshold".into(),
            curve.iter().map(|p| p.score_threshold).collect::<Vec<f32>>(),
        ),
        Column::new(
            "precision".into(),
            curve.iter().map(|p| p.precision).collect::<Vec<f32>>(),
        ),
        Column::new(
            "recall".into(),
            curve.iter().map(|p| p.recall).collect::<Vec<Option<f32>>>(),
        ),
        Column::new(
            "predictions".into(),
            curve.iter().map(|p| p.predictions as u32).collect::<Vec<u32>>(),
        ),
        Column::new(
            "matched".into(),
            curve.iter().map(|p| p.matched as u32).collect::<Vec<u32>>(),
        ),
    ])
    .map_err(|err| ClutterError::BenchmarkError(err.to_string()))
}

/// Pixel-weighted precision/recall sweep over prediction scores
#[derive(Debug, Clone, Copy, Default)]
pub struct SaurabhBenchmark {
    pub verbose: bool,
}

impl Benchmark for SaurabhBenchmark {
    fn name(&self) -> &'static str {
        "saurabh"
    }

    fn run(
        &self,
        run_dir: &Path,
        _config: &ClutterConfig,
        model: &dyn Segmenter,
        dataset: &dyn Dataset,
    ) -> Result<PathBuf, ClutterError> {
        let output = output_dir(run_dir, self.name())?;

        let results = predict_dataset(model, dataset, "Saurabh benchmark", self.verbose)?;
        let curve = pr_curve(&results);
        let summary = summarize(&results, &curve);

        write_table(&mut curve_table(&curve)?, output.join("pr_curve.tsv"))?;
        write_json(&summary, output.join("summary.json"))?;

        progress_log(
            &format!(
                "Saurabh PR AUC {} | best F1 {}",
                summary
                    .auc
                    .map(|v| format!("{:.3}", v))
                    .unwrap_or("n/a".into()),
                summary
                    .best_f1
                    .map(|v| format!("{:.3}", v))
                    .unwrap_or("n/a".into())
            ),
            self.verbose,
        );

        Ok(output)
    }
}

/// Run the Saurabh benchmark and write `saurabh/` under the run directory
pub fn s_benchmark(
    run_dir: &Path,
    config: &ClutterConfig,
    model: &dyn Segmenter,
    dataset: &dyn Dataset,
    verbose: bool,
) -> Result<PathBuf, ClutterError> {
    SaurabhBenchmark { verbose }.run(run_dir, config, model, dataset)
}
