// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use clutter_core::config::ImageType;
use clutter_core::constant;
use clutter_core::error::ClutterError;

use crate::data::{Dataset, Sample};
use crate::indices::read_indices;

/// Synthetic training data indexed by `<split>_indices.npy`
///
/// Expected layout under the base path:
///
/// ```text
/// <base>/<img_type>_ims/image_000000.png
/// <base>/modal_segmasks/image_000000.png
/// <base>/train_indices.npy
/// <base>/test_indices.npy
/// ```
#[derive(Debug, Clone)]
pub struct SimImageDataset {
    base_path: PathBuf,
    img_type: ImageType,
    split: Option<String>,
    indices: Vec<u64>,
    samples: Vec<Sample>,
    prepared: bool,
}

impl SimImageDataset {
    pub fn new<P: AsRef<Path>>(base_path: P, img_type: ImageType) -> Self {
        SimImageDataset {
            base_path: base_path.as_ref().to_path_buf(),
            img_type,
            split: None,
            indices: vec![],
            samples: vec![],
            prepared: false,
        }
    }

    pub fn split(&self) -> Option<&str> {
        self.split.as_deref()
    }

    /// File name of the image with a given index
    pub fn file_name(index: u64) -> String {
        format!("image_{:06}.png", index)
    }
}

impl Dataset for SimImageDataset {
    fn load(&mut self, split: &str) -> Result<(), ClutterError> {
        let index_file = self.base_path.join(format!("{}_indices.npy", split));
        self.indices = read_indices(&index_file)?;
        self.split = Some(split.to_string());
        self.samples.clear();
        self.prepared = false;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), ClutterError> {
        let split = self.split.as_deref().ok_or_else(|| {
            ClutterError::DatasetError("A split must be loaded before prepare".to_string())
        })?;

        let image_dir = self.base_path.join(self.img_type.dir_name());
        let mask_dir = self.base_path.join(constant::SEGMASK_DIR);

        let mut samples = Vec::with_capacity(self.indices.len());
        for &index in &self.indices {
            let name = Self::file_name(index);
            let image = image_dir.join(&name);
            let mask = mask_dir.join(&name);

            for path in [&image, &mask] {
                if !path.is_file() {
                    return Err(ClutterError::NoFileError(format!(
                        "{} (listed in {} split)",
                        path.display(),
                        split
                    )));
                }
            }

            samples.push(Sample {
                id: name.trim_end_matches(".png").to_string(),
                image,
                mask,
            });
        }

        if samples.is_empty() {
            return Err(ClutterError::DatasetError(format!(
                "Split {} of {} has no images",
                split,
                self.base_path.display()
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
