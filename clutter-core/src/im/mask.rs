// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::collections::BTreeMap;
use std::path::Path;

use image::{DynamicImage, open as open_dynamic};

use crate::cv::connected_components;
use crate::error::ClutterError;

/// A label image where 0 is background and every other value is one instance
///
/// # Examples
///
/// ```
/// use clutter_core::im::LabelMask;
///
/// let mask = LabelMask::new(3, 1, vec![0, 7, 7]).unwrap();
/// let instances = mask.instances();
///
/// assert_eq!(instances.len(), 1);
/// assert_eq!(instances[0].area(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMask {
    width: u32,
    height: u32,
    labels: Vec<u32>,
}

impl LabelMask {
    pub fn new(width: u32, height: u32, labels: Vec<u32>) -> Result<LabelMask, ClutterError> {
        if labels.len() != (width as usize) * (height as usize) {
            return Err(ClutterError::MaskError(
                "Label buffer does not match provided size.",
            ));
        }

        Ok(LabelMask {
            width,
            height,
            labels,
        })
    }

    /// Open a label image from a provided path
    ///
    /// Only 8 and 16-bit single-channel images (optionally with alpha) are
    /// accepted, since color conversion would merge distinct labels.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LabelMask, ClutterError> {
        let path = path.as_ref();

        let dynamic = open_dynamic(path)
            .map_err(|_| ClutterError::MaskReadError(path.display().to_string()))?;

        let width = dynamic.width();
        let height = dynamic.height();

        let labels: Vec<u32> = match dynamic {
            DynamicImage::ImageLuma8(buffer) => {
                buffer.into_raw().into_iter().map(u32::from).collect()
            }
            DynamicImage::ImageLumaA8(buffer) => buffer
                .into_raw()
                .chunks_exact(2)
                .map(|pixel| u32::from(pixel[0]))
                .collect(),
            DynamicImage::ImageLuma16(buffer) => {
                buffer.into_raw().into_iter().map(u32::from).collect()
            }
            DynamicImage::ImageLumaA16(buffer) => buffer
                .into_raw()
                .chunks_exact(2)
                .map(|pixel| u32::from(pixel[0]))
                .collect(),
            _ => {
                return Err(ClutterError::MaskError(
                    "Only 1-channel u8 and u16 label images are currently supported.",
                ));
            }
        };

        LabelMask::new(width, height, labels)
    }

    /// Label a binary foreground into 8-connected instances
    pub fn from_foreground(
        width: u32,
        height: u32,
        foreground: &[bool],
    ) -> Result<LabelMask, ClutterError> {
        if foreground.len() != (width as usize) * (height as usize) {
            return Err(ClutterError::MaskError(
                "Foreground buffer does not match provided size.",
            ));
        }

        let buffer: Vec<u32> = foreground.iter().map(|&f| u32::from(f)).collect();
        LabelMask::new(width, height, connected_components(width, height, &buffer))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Binary foreground as 0.0/1.0 targets
    pub fn foreground(&self) -> Vec<f32> {
        self.labels
            .iter()
            .map(|&l| if l > 0 { 1.0 } else { 0.0 })
            .collect()
    }

    /// Split the label image into instances ordered by label value
    pub fn instances(&self) -> Vec<Instance> {
        let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

        for (idx, &label) in self.labels.iter().enumerate() {
            if label > 0 {
                groups.entry(label).or_default().push(idx as u32);
            }
        }

        groups
            .into_values()
            .map(|pixels| Instance { pixels, score: 1.0 })
            .collect()
    }
}

/// A single object as a sorted list of row-major pixel indices
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub pixels: Vec<u32>,
    pub score: f32,
}

impl Instance {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// Number of pixels shared with another instance
    pub fn intersection(&self, other: &Instance) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);

        while i < self.pixels.len() && j < other.pixels.len() {
            match self.pixels[i].cmp(&other.pixels[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }

        shared
    }

    /// Intersection over union of two instances
    ///
    /// # Examples
    ///
    /// ```
    /// use clutter_core::im::Instance;
    ///
    /// let a = Instance { pixels: vec![0, 1, 2, 3], score: 1.0 };
    /// let b = Instance { pixels: vec![2, 3, 4, 5], score: 1.0 };
    ///
    /// assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    /// ```
    pub fn iou(&self, other: &Instance) -> f32 {
        let intersection = self.intersection(other);
        let union = self.area() + other.area() - intersection;

        if union == 0 {
            return 0.0;
        }

        intersection as f32 / union as f32
    }
}
