// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

mod real;
mod sim;

pub use real::RealImageDataset;
pub use sim::SimImageDataset;

use std::path::PathBuf;

use clutter_core::error::ClutterError;
use clutter_core::im::{ClutterImage, LabelMask};

/// An image and its instance label mask
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample {
    pub id: String,
    pub image: PathBuf,
    pub mask: PathBuf,
}

/// A collection of image and segmask pairs bound to a directory
///
/// Datasets are used in two steps: `load` selects a split and `prepare`
/// indexes and validates the samples. Accessors fail on an unprepared
/// dataset.
pub trait Dataset {
    /// Select the split to read (e.g. "train" or "test")
    fn load(&mut self, split: &str) -> Result<(), ClutterError>;

    /// Index the samples of the loaded split
    fn prepare(&mut self) -> Result<(), ClutterError>;

    /// Prepared samples, empty until `prepare` succeeds
    fn samples(&self) -> &[Sample];

    fn is_prepared(&self) -> bool;

    fn len(&self) -> usize {
        self.samples().len()
    }

    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    fn sample(&self, index: usize) -> Result<&Sample, ClutterError> {
        if !self.is_prepared() {
            return Err(ClutterError::DatasetError(
                "Dataset must be loaded and prepared before use".to_string(),
            ));
        }

        self.samples().get(index).ok_or_else(|| {
            ClutterError::DatasetError(format!(
                "Index {} is out of bounds for {} samples",
                index,
                self.len()
            ))
        })
    }

    fn load_image(&self, index: usize) -> Result<ClutterImage, ClutterError> {
        ClutterImage::open(&self.sample(index)?.image)
    }

    fn load_mask(&self, index: usize) -> Result<LabelMask, ClutterError> {
        LabelMask::open(&self.sample(index)?.mask)
    }
}
