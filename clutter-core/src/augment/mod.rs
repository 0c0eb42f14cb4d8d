// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

mod noise;

pub use noise::NoiseAugmenter;

use crate::error::ClutterError;
use crate::im::ClutterImage;

/// Produces an augmented copy of a grayscale image
///
/// Implementations are constructed from the augment task configuration and
/// may hold random state, so `augment` takes `&mut self`.
pub trait Augmenter {
    fn augment(&mut self, image: &ClutterImage) -> Result<ClutterImage, ClutterError>;
}

impl<A: Augmenter + ?Sized> Augmenter for Box<A> {
    fn augment(&mut self, image: &ClutterImage) -> Result<ClutterImage, ClutterError> {
        (**self).augment(image)
    }
}
