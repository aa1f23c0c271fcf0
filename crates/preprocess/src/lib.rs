//! Image Preprocessing
//!
//! Turns an uploaded image byte stream into the fixed-size normalized
//! pixel vector the digit classifier consumes.

mod normalizer;

pub use normalizer::{normalize, NormalizedVector};

use thiserror::Error;

/// Model input width in pixels
pub const INPUT_WIDTH: u32 = 28;

/// Model input height in pixels
pub const INPUT_HEIGHT: u32 = 28;

/// Flattened model input length
pub const INPUT_LEN: usize = (INPUT_WIDTH * INPUT_HEIGHT) as usize;

/// Errors during preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}
