//! Image decoding and tensor preparation

use image::imageops::FilterType;

use crate::error::Result;

/// ImageNet channel statistics the classifier was trained with
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode image bytes into a normalized CHW `f32` buffer of
/// `3 * size * size` values: RGB, bilinear resize to a square, then
/// per-channel `(x / 255 - mean) / std`.
pub fn image_to_tensor(bytes: &[u8], size: u32) -> Result<Vec<f32>> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::Triangle);

    let plane = (size * size) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for channel in 0..3 {
            let value = pixel.0[channel] as f32 / 255.0;
            tensor[channel * plane + offset] = (value - MEAN[channel]) / STD[channel];
        }
    }

    Ok(tensor)
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and probability of the most likely class
pub fn top1(probabilities: &[f64]) -> Option<(usize, f64)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb(color));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_tensor_shape_and_normalization() {
        let tensor = image_to_tensor(&png(10, 6, [255, 0, 0]), 4).unwrap();
        assert_eq!(tensor.len(), 3 * 4 * 4);

        let red = (1.0 - MEAN[0]) / STD[0];
        let green = (0.0 - MEAN[1]) / STD[1];
        assert!((tensor[0] - red).abs() < 1e-5);
        assert!((tensor[16] - green).abs() < 1e-5);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(image_to_tensor(b"definitely not an image", 4).is_err());
    }

    #[test]
    fn test_softmax_and_top1() {
        let probs = softmax(&[0.0, 0.0]);
        assert!((probs[0] - 0.5).abs() < 1e-9);

        let probs = softmax(&[1.0, 3.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let (label, confidence) = top1(&probs).unwrap();
        assert_eq!(label, 1);
        assert!(confidence > 0.88 && confidence < 0.89);

        assert_eq!(top1(&[]), None);
    }
}
