//! Upload-to-vector normalization pipeline

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::{PreprocessError, INPUT_HEIGHT, INPUT_LEN, INPUT_WIDTH};

/// Flattened, scaled pixel vector ready for inference.
///
/// Always `INPUT_LEN` values in `[0.0, 1.0]`, row-major.
pub type NormalizedVector = Vec<f32>;

/// Convert raw upload bytes into a normalized model input vector.
///
/// Decodes the byte stream (any container the `image` crate recognizes),
/// converts to single-channel grayscale, resizes to the model's 28x28
/// input with bilinear filtering, flattens row-major, and scales the
/// 0-255 intensities to `[0.0, 1.0]`.
///
/// Pure function of the input bytes: identical bytes always produce a
/// bit-identical vector.
pub fn normalize(bytes: &[u8]) -> Result<NormalizedVector, PreprocessError> {
    let decoded = image::load_from_memory(bytes)?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        "Decoded uploaded image"
    );

    let grayscale = decoded.to_luma8();
    let resized = imageops::resize(&grayscale, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);

    let vector: NormalizedVector = resized
        .into_raw()
        .into_iter()
        .map(|intensity| f32::from(intensity) / 255.0)
        .collect();

    debug_assert_eq!(vector.len(), INPUT_LEN);
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat};
    use proptest::prelude::*;
    use std::io::Cursor;

    /// Encode a grayscale image built from a pixel function as PNG bytes.
    fn png_bytes(width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let img = GrayImage::from_fn(width, height, |x, y| image::Luma([pixel(x, y)]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("in-memory PNG encode");
        buf
    }

    #[test]
    fn test_output_length_and_range() {
        let bytes = png_bytes(100, 60, |x, y| ((x + y) % 256) as u8);
        let vector = normalize(&bytes).unwrap();

        assert_eq!(vector.len(), INPUT_LEN);
        assert!(vector.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_native_resolution_passthrough() {
        let bytes = png_bytes(INPUT_WIDTH, INPUT_HEIGHT, |x, _| if x < 14 { 0 } else { 255 });
        let vector = normalize(&bytes).unwrap();

        assert_eq!(vector.len(), INPUT_LEN);
        // Dark half stays dark, bright half stays bright
        assert!(vector[0] < 0.5);
        assert!(vector[INPUT_WIDTH as usize - 1] > 0.5);
    }

    #[test]
    fn test_deterministic_for_identical_bytes() {
        let bytes = png_bytes(37, 41, |x, y| ((x * 7 + y * 13) % 256) as u8);
        let first = normalize(&bytes).unwrap();
        let second = normalize(&bytes).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let garbage = b"definitely not an image container";
        let result = normalize(garbage);

        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn test_jpeg_input_accepted() {
        let img = GrayImage::from_fn(32, 32, |x, y| image::Luma([((x * y) % 256) as u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .expect("in-memory JPEG encode");

        let vector = normalize(&buf).unwrap();
        assert_eq!(vector.len(), INPUT_LEN);
    }

    proptest! {
        #[test]
        fn prop_any_valid_png_normalizes(width in 1u32..48, height in 1u32..48, seed in any::<u8>()) {
            let bytes = png_bytes(width, height, |x, y| {
                ((x * 31 + y * 17 + u32::from(seed)) % 256) as u8
            });
            let vector = normalize(&bytes).unwrap();

            prop_assert_eq!(vector.len(), INPUT_LEN);
            prop_assert!(vector.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}
