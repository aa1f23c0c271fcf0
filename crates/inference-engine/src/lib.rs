//! ONNX Digit Classification Engine
//!
//! Loads a frozen MNIST classifier once at startup and runs single-image
//! forward passes using tract-onnx.

mod engine;

pub use engine::{DigitClassifier, Prediction, CLASS_COUNT, INPUT_LEN};

use thiserror::Error;

/// Fatal errors while bringing up the classifier.
///
/// The process must not start serving when model loading fails.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Model load failed for {path}: {detail}")]
    ModelLoad { path: String, detail: String },
}

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength { expected: usize, actual: usize },
    #[error("Model produced no class scores")]
    EmptyOutput,
}
