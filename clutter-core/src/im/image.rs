// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::Path;

use image::{GrayImage, open as open_dynamic};

use crate::constant;
use crate::error::ClutterError;

/// A single-channel image with intensities stored as f32 in [0, 1]
///
/// Every input is converted to grayscale on read. Color inputs are reduced
/// with the standard luma weights.
///
/// # Examples
///
/// ```
/// use clutter_core::im::ClutterImage;
///
/// let image = ClutterImage::new(2, 2, vec![0.0, 0.25, 0.5, 1.0]).unwrap();
/// assert_eq!(image.get(1, 1), 1.0);
/// assert!(ClutterImage::new(2, 2, vec![0.0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClutterImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

// >>> I/O METHODS

impl ClutterImage {
    /// Open an image from a provided path as grayscale
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use clutter_core::im::ClutterImage;
    /// let image = ClutterImage::open("image_000000.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ClutterImage, ClutterError> {
        let path = path.as_ref();

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension {
            Some(ext) if constant::IMAGE_DYNAMIC_FORMATS.contains(&ext.as_str()) => {
                let dynamic = open_dynamic(path)
                    .map_err(|_| ClutterError::ImageReadError(path.display().to_string()))?;

                let gray = dynamic.to_luma32f();
                let (width, height) = gray.dimensions();

                ClutterImage::new(width, height, gray.into_raw())
            }
            _ => Err(ClutterError::ImageExtensionError),
        }
    }

    /// Save the image as an 8-bit grayscale image
    ///
    /// Intensities are clamped to [0, 1] before quantization. The output
    /// format is inferred from the path extension.
    ///
    /// # Arguments
    ///
    /// * `path` - Output path with a valid image extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClutterError> {
        let path = path.as_ref();

        let buffer: Vec<u8> = self
            .data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();

        let gray = GrayImage::from_raw(self.width, self.height, buffer)
            .ok_or(ClutterError::ImageSizeError)?;

        gray.save(path)
            .map_err(|_| ClutterError::ImageWriteError(path.display().to_string()))
    }
}

// >>> CONSTRUCTION AND ACCESS

impl ClutterImage {
    /// Initialize a new image from a row-major buffer
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<ClutterImage, ClutterError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(ClutterError::ImageSizeError);
        }

        Ok(ClutterImage {
            width,
            height,
            data,
        })
    }

    pub fn zeros(width: u32, height: u32) -> ClutterImage {
        ClutterImage {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixels(&self) -> &[f32] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_pixels(self) -> Vec<f32> {
        self.data
    }

    /// Intensity at column `x` and row `y`
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }

        self.data.iter().sum::<f32>() / self.data.len() as f32
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage};

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("CLUTTER_TEST_IMAGE_{}", name))
    }

    #[test]
    fn test_open_gray_u8() {
        let path = scratch("GRAY_U8.png");
        GrayImage::from_raw(2, 1, vec![0, 255]).unwrap().save(&path).unwrap();

        let image = ClutterImage::open(&path).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.pixels(), &[0.0, 1.0]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_gray_u16() {
        let path = scratch("GRAY_U16.png");
        let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![0, u16::MAX]).unwrap();
        DynamicImage::ImageLuma16(buffer).save(&path).unwrap();

        let image = ClutterImage::open(&path).unwrap();
        assert_eq!(image.pixels(), &[0.0, 1.0]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_rgb_as_gray() {
        let path = scratch("RGB.png");
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, Rgb([255, 255, 255]));
        rgb.save(&path).unwrap();

        let image = ClutterImage::open(&path).unwrap();
        assert_eq!(image.len(), 1);
        assert!((image.get(0, 0) - 1.0).abs() < 1e-3);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_invalid() {
        assert_eq!(
            ClutterImage::open("notes.txt"),
            Err(ClutterError::ImageExtensionError)
        );

        let path = scratch("CORRUPT.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            ClutterImage::open(&path),
            Err(ClutterError::ImageReadError(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_clamps_and_round_trips() {
        let path = scratch("SAVE.png");
        let image = ClutterImage::new(2, 2, vec![-1.0, 0.0, 1.0, 2.0]).unwrap();
        image.save(&path).unwrap();

        let reopened = ClutterImage::open(&path).unwrap();
        assert_eq!(reopened.pixels(), &[0.0, 0.0, 1.0, 1.0]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_mean() {
        let image = ClutterImage::new(2, 1, vec![0.25, 0.75]).unwrap();
        assert_eq!(image.mean(), 0.5);
        assert_eq!(ClutterImage::zeros(0, 0).mean(), 0.0);
    }
}
