//! Digit classifier implementation

use serde::{Deserialize, Serialize};
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::{InferenceError, StartupError};

/// Flattened model input length (28x28 grayscale)
pub const INPUT_LEN: usize = 784;

/// Number of digit classes
pub const CLASS_COUNT: usize = 10;

type RunnableOnnx = TypedRunnableModel<TypedModel>;

/// Prediction result from one forward pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted digit (0-9)
    pub digit: u8,
    /// Softmax probability of the predicted class (0.0 to 1.0)
    pub confidence: f32,
}

/// Frozen MNIST digit classifier.
///
/// The model is loaded exactly once and never mutated afterwards, so one
/// instance can serve concurrent `infer` calls without locking.
pub struct DigitClassifier {
    model: Option<RunnableOnnx>,
    model_path: String,
}

impl DigitClassifier {
    /// Load and optimize the ONNX model at `path`.
    ///
    /// Fails with `StartupError` when the artifact is missing or malformed;
    /// callers must treat that as fatal and refuse to serve.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path = path.as_ref();
        info!("Loading digit model from {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec![1, INPUT_LEN]),
                )
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| StartupError::ModelLoad {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;

        info!("Digit model loaded and frozen for inference");
        Ok(Self {
            model: Some(model),
            model_path: path.display().to_string(),
        })
    }

    /// Create a model-free classifier for testing.
    ///
    /// Predictions are derived deterministically from the input vector
    /// (argmax over per-class chunk sums), exercising the same validation
    /// and scoring paths as the real model.
    pub fn mock() -> Self {
        info!("Creating mock digit classifier");
        Self {
            model: None,
            model_path: "mock".to_string(),
        }
    }

    /// Run one forward pass and return the highest-scoring digit.
    ///
    /// Deterministic for a fixed model and input; takes `&self` and never
    /// mutates model state.
    pub fn infer(&self, input: &[f32]) -> Result<Prediction, InferenceError> {
        if input.len() != INPUT_LEN {
            return Err(InferenceError::InvalidInputLength {
                expected: INPUT_LEN,
                actual: input.len(),
            });
        }

        let scores = match &self.model {
            Some(model) => Self::run_model(model, input)?,
            None => mock_scores(input),
        };

        let (digit, confidence) = top_class(&scores)?;
        debug!(digit, confidence, "Inference complete");

        Ok(Prediction { digit, confidence })
    }

    /// Get model path
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    fn run_model(model: &RunnableOnnx, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(&[1, INPUT_LEN], input)
            .map_err(|e| InferenceError::ExecutionFailed(e.to_string()))?;

        let outputs = model
            .run(tvec![tensor.into()])
            .map_err(|e| InferenceError::ExecutionFailed(e.to_string()))?;

        let view = outputs
            .first()
            .ok_or(InferenceError::EmptyOutput)?
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::ExecutionFailed(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }
}

/// Argmax over raw class scores plus softmax confidence of the winner.
fn top_class(scores: &[f32]) -> Result<(u8, f32), InferenceError> {
    let (best_idx, best_score) = scores
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or(InferenceError::EmptyOutput)?;

    // Shift by the max score so exp() cannot overflow
    let denom: f32 = scores.iter().map(|s| (s - best_score).exp()).sum();
    let confidence = if denom > 0.0 { 1.0 / denom } else { 0.0 };

    Ok((best_idx as u8, confidence))
}

/// Deterministic stand-in scores for the mock classifier: one score per
/// class, each the sum of an equal slice of the input vector.
fn mock_scores(input: &[f32]) -> Vec<f32> {
    let chunk = INPUT_LEN / CLASS_COUNT;
    (0..CLASS_COUNT)
        .map(|class| {
            let start = class * chunk;
            let end = if class == CLASS_COUNT - 1 {
                input.len()
            } else {
                start + chunk
            };
            input[start..end].iter().sum()
        })
        .collect()
}
