// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Device, Result, Tensor};

use clutter_core::im::{ClutterImage, LabelMask};

/// Convert a grayscale image to a mean-subtracted (1, 1, height, width) tensor
pub fn to_tensor(image: &ClutterImage, mean: f32, device: &Device) -> Result<Tensor> {
    let w = image.width() as usize;
    let h = image.height() as usize;

    Tensor::from_vec(image.pixels().to_vec(), (1, 1, h, w), device)?.affine(1.0, -(mean as f64))
}

/// Convert a label image to a binary (1, 1, height, width) foreground target
pub fn to_target(mask: &LabelMask, device: &Device) -> Result<Tensor> {
    let w = mask.width() as usize;
    let h = mask.height() as usize;

    Tensor::from_vec(mask.foreground(), (1, 1, h, w), device)
}

/// Flattened per-pixel foreground probabilities from network logits
pub fn probabilities(logits: &Tensor) -> Result<Vec<f32>> {
    candle_nn::ops::sigmoid(logits)?.flatten_all()?.to_vec1::<f32>()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_tensor_subtracts_mean() {
        let image = ClutterImage::new(2, 1, vec![0.5, 1.0]).unwrap();
        let tensor = to_tensor(&image, 0.5, &Device::Cpu).unwrap();

        assert_eq!(tensor.dims(), &[1, 1, 1, 2]);
        let values = tensor.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(values, vec![0.0, 0.5]);
    }

    #[test]
    fn test_to_target() {
        let mask = LabelMask::new(3, 1, vec![0, 4, 9]).unwrap();
        let target = to_target(&mask, &Device::Cpu).unwrap();

        let values = target.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(values, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_probabilities() {
        let logits = Tensor::new(&[[[[0.0f32, 100.0]]]], &Device::Cpu).unwrap();
        let probs = probabilities(&logits).unwrap();

        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs[1] > 0.99);
    }
}
