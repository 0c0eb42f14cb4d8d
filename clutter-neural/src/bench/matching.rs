// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clutter_core::im::Instance;

/// Greedily match ranked predictions to ground truth instances
///
/// Predictions are visited in the given order. Each one takes the unmatched
/// ground truth instance with the highest IoU, provided that IoU reaches
/// `threshold`. Returns the matched ground truth index per prediction.
///
/// # Examples
///
/// ```
/// use clutter_core::im::Instance;
/// use clutter_neural::bench::greedy_match;
///
/// let gt = vec![Instance { pixels: vec![0, 1, 2, 3], score: 1.0 }];
/// let a = Instance { pixels: vec![0, 1, 2], score: 0.9 };
/// let b = Instance { pixels: vec![0, 1, 2, 3], score: 0.8 };
///
/// assert_eq!(greedy_match(&[&a, &b], &gt, 0.5), vec![Some(0), None]);
/// ```
pub fn greedy_match(
    predictions: &[&Instance],
    ground_truth: &[Instance],
    threshold: f32,
) -> Vec<Option<usize>> {
    let mut taken = vec![false; ground_truth.len()];

    predictions
        .iter()
        .map(|prediction| {
            let mut best: Option<(usize, f32)> = None;

            for (idx, gt) in ground_truth.iter().enumerate() {
                if taken[idx] {
                    continue;
                }

                let iou = prediction.iou(gt);
                if iou >= threshold && best.is_none_or(|(_, best_iou)| iou > best_iou) {
                    best = Some((idx, iou));
                }
            }

            best.map(|(idx, _)| {
                taken[idx] = true;
                idx
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn instance(pixels: &[u32]) -> Instance {
        Instance {
            pixels: pixels.to_vec(),
            score: 1.0,
        }
    }

    #[test]
    fn test_prefers_highest_iou() {
        let gt = vec![instance(&[0, 1]), instance(&[0, 1, 2, 3])];
        let prediction = instance(&[0, 1, 2]);

        assert_eq!(greedy_match(&[&prediction], &gt, 0.5), vec![Some(1)]);
    }

    #[test]
    fn test_threshold_and_empty() {
        let gt = vec![instance(&[0, 1, 2, 3])];
        let prediction = instance(&[3, 4, 5]);

        assert_eq!(greedy_match(&[&prediction], &gt, 0.5), vec![None]);
        assert_eq!(greedy_match(&[&prediction], &[], 0.5), vec![None]);
        assert!(greedy_match(&[], &gt, 0.5).is_empty());
    }
}
