// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::augment::Augmenter;
use crate::config::AugmentConfig;
use crate::error::ClutterError;
use crate::im::ClutterImage;

/// Noise and simple geometric filters applied in a fixed order
///
/// Filters run as: horizontal flip, box blur, brightness shift, gaussian
/// noise, salt-and-pepper noise. Output intensities are clamped to [0, 1].
/// Filters with a zero parameter are skipped, so a default configuration
/// copies images unchanged.
#[derive(Debug)]
pub struct NoiseAugmenter {
    noise: Option<Normal<f32>>,
    salt_pepper: f32,
    blur_radius: u32,
    brightness: f32,
    flip_probability: f32,
    rng: StdRng,
}

impl NoiseAugmenter {
    /// Build an augmenter from the augment task configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use clutter_core::augment::{Augmenter, NoiseAugmenter};
    /// use clutter_core::config::AugmentConfig;
    /// use clutter_core::im::ClutterImage;
    ///
    /// let config = AugmentConfig {
    ///     img_dir: "in".into(),
    ///     out_dir: "out".into(),
    ///     num_imgs: 1,
    ///     noise_std: 0.0,
    ///     salt_pepper: 0.0,
    ///     blur_radius: 0,
    ///     brightness: 0.1,
    ///     flip_probability: 0.0,
    ///     seed: Some(0),
    /// };
    ///
    /// let mut augmenter = NoiseAugmenter::new(&config).unwrap();
    /// let image = ClutterImage::new(2, 1, vec![0.2, 0.95]).unwrap();
    /// let augmented = augmenter.augment(&image).unwrap();
    ///
    /// assert!((augmented.get(0, 0) - 0.3).abs() < 1e-6);
    /// assert_eq!(augmented.get(1, 0), 1.0);
    /// ```
    pub fn new(config: &AugmentConfig) -> Result<NoiseAugmenter, ClutterError> {
        if !(config.noise_std >= 0.0 && config.noise_std.is_finite()) {
            return Err(ClutterError::SchemaError(
                "noise_std must be a finite value >= 0".to_string(),
            ));
        }

        for (name, value) in [
            ("salt_pepper", config.salt_pepper),
            ("flip_probability", config.flip_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ClutterError::SchemaError(format!(
                    "{} must be within [0, 1]",
                    name
                )));
            }
        }

        let noise = if config.noise_std > 0.0 {
            Some(
                Normal::new(0.0, config.noise_std)
                    .map_err(|err| ClutterError::SchemaError(err.to_string()))?,
            )
        } else {
            None
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(NoiseAugmenter {
            noise,
            salt_pepper: config.salt_pepper,
            blur_radius: config.blur_radius,
            brightness: config.brightness,
            flip_probability: config.flip_probability,
            rng,
        })
    }
}

impl Augmenter for NoiseAugmenter {
    fn augment(&mut self, image: &ClutterImage) -> Result<ClutterImage, ClutterError> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let mut pixels = image.pixels().to_vec();

        if self.flip_probability > 0.0 && self.rng.random_bool(self.flip_probability as f64) {
            for row in pixels.chunks_exact_mut(width.max(1)) {
                row.reverse();
            }
        }

        if self.blur_radius > 0 {
            pixels = box_blur(&pixels, width, height, self.blur_radius as usize);
        }

        if self.brightness != 0.0 {
            pixels.iter_mut().for_each(|p| *p += self.brightness);
        }

        if let Some(noise) = &self.noise {
            for p in pixels.iter_mut() {
                *p += noise.sample(&mut self.rng);
            }
        }

        if self.salt_pepper > 0.0 {
            for p in pixels.iter_mut() {
                if self.rng.random::<f32>() < self.salt_pepper {
                    *p = if self.rng.random_bool(0.5) { 1.0 } else { 0.0 };
                }
            }
        }

        pixels.iter_mut().for_each(|p| *p = p.clamp(0.0, 1.0));

        ClutterImage::new(image.width(), image.height(), pixels)
    }
}

/// Separable mean filter with edge clamping
fn box_blur(pixels: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    if width == 0 || height == 0 {
        return pixels.to_vec();
    }

    let window = (2 * radius + 1) as f32;
    let clamp = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    let mut horizontal = vec![0.0; pixels.len()];
    for y in 0..height {
        let row = &pixels[y * width..(y + 1) * width];
        for x in 0..width {
            let center = x as isize;
            let sum: f32 = (center - radius as isize..=center + radius as isize)
                .map(|i| row[clamp(i, width)])
                .sum();
            horizontal[y * width + x] = sum / window;
        }
    }

    let mut output = vec![0.0; pixels.len()];
    for y in 0..height {
        let center = y as isize;
        for x in 0..width {
            let sum: f32 = (center - radius as isize..=center + radius as isize)
                .map(|i| horizontal[clamp(i, height) * width + x])
                .sum();
            output[y * width + x] = sum / window;
        }
    }

    output
}
