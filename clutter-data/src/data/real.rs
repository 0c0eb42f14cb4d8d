// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use clutter_core::config::ImageType;
use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::ut::path::{collect_file_paths, collect_file_pairs};

use crate::data::{Dataset, Sample};

/// Real test images paired with segmasks by file stem
///
/// Expected layout under the test directory:
///
/// ```text
/// <test_dir>/<img_type>_ims/<name>.png
/// <test_dir>/modal_segmasks/<name>.png
/// ```
///
/// The split name is recorded but does not change which files are read.
#[derive(Debug, Clone)]
pub struct RealImageDataset {
    test_dir: PathBuf,
    img_type: ImageType,
    split: Option<String>,
    samples: Vec<Sample>,
    prepared: bool,
}

impl RealImageDataset {
    pub fn new<P: AsRef<Path>>(test_dir: P, img_type: ImageType) -> Self {
        RealImageDataset {
            test_dir: test_dir.as_ref().to_path_buf(),
            img_type,
            split: None,
            samples: vec![],
            prepared: false,
        }
    }

    pub fn split(&self) -> Option<&str> {
        self.split.as_deref()
    }
}

impl Dataset for RealImageDataset {
    fn load(&mut self, split: &str) -> Result<(), ClutterError> {
        if !self.test_dir.is_dir() {
            return Err(ClutterError::DirError(self.test_dir.display().to_string()));
        }

        self.split = Some(split.to_string());
        self.samples.clear();
        self.prepared = false;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), ClutterError> {
        if self.split.is_none() {
            return Err(ClutterError::DatasetError(
                "A split must be loaded before prepare".to_string(),
            ));
        }

        let image_files = collect_file_paths(
            self.test_dir.join(self.img_type.dir_name()),
            &[constant::PNG_EXTENSION],
            None,
        )?;

        let mask_files = collect_file_paths(
            self.test_dir.join(constant::SEGMASK_DIR),
            &[constant::PNG_EXTENSION],
            None,
        )?;

        let samples: Vec<Sample> = collect_file_pairs(&image_files, &mask_files)
            .into_iter()
            .map(|(id, image, mask)| Sample { id, image, mask })
            .collect();

        if samples.is_empty() {
            return Err(ClutterError::DatasetError(format!(
                "No image and segmask pairs were detected in {}",
                self.test_dir.display()
            )));
        }

        self.samples = samples;
        self.prepared = true;
        Ok(())
    }

    fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn is_prepared(&self) -> bool {
        self.prepared
    }
}
