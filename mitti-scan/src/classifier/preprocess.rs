//! Image preprocessing for the soil classifier

use crate::error::{ScanError, ScanResult};
use image::imageops::FilterType;

/// Square input edge expected by the model
pub const INPUT_SIZE: u32 = 224;

/// Channels per pixel (RGB)
pub const INPUT_CHANNELS: usize = 3;

/// Flattened input length (224 × 224 × 3)
pub const INPUT_LEN: usize = (INPUT_SIZE as usize) * (INPUT_SIZE as usize) * INPUT_CHANNELS;

/// Decode, resize to 224×224 and flatten to HWC floats in [0, 1]
///
/// The aspect ratio is not preserved; the camera frame is stretched to the
/// square input the model was trained on.
pub fn image_to_tensor(bytes: &[u8]) -> ScanResult<Vec<f32>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ScanError::Inference(format!("Image decode failed: {}", e)))?;

    let rgb = decoded
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let tensor: Vec<f32> = rgb
        .into_raw()
        .into_iter()
        .map(|channel| f32::from(channel) / 255.0)
        .collect();

    debug_assert_eq!(tensor.len(), INPUT_LEN);
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_tensor_shape_and_range() {
        let tensor = image_to_tensor(&png(640, 480, [255, 0, 51])).unwrap();
        assert_eq!(tensor.len(), INPUT_LEN);
        assert_eq!(tensor[0], 1.0);
        assert_eq!(tensor[1], 0.0);
        assert!((tensor[2] - 0.2).abs() < 1e-6);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_garbage_bytes_are_inference_error() {
        let result = image_to_tensor(b"definitely not an image");
        assert!(matches!(result, Err(ScanError::Inference(_))));
    }
}
