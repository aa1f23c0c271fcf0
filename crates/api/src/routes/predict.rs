//! Digit prediction route

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// File extensions the endpoint accepts, lowercase without the dot
const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];

/// Multipart form field carrying the image
const UPLOAD_FIELD: &str = "uploaded_image";

/// Prediction response body
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted digit (0-9)
    pub digit: u8,
}

/// One uploaded image as read from the multipart body
struct Upload {
    filename: String,
    bytes: Bytes,
}

/// Predict the digit in an uploaded image.
///
/// Validates the file extension, normalizes the image into the model's
/// input vector, runs one timed forward pass, updates the telemetry
/// instruments, and returns the predicted label. Each request is a single
/// attempt; failures go straight back to the caller.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    // Count every received request per caller, before any validation, so
    // rejected requests still show up in the counter.
    state.telemetry.record_request(&addr.ip().to_string());

    let upload = read_upload(multipart).await?;
    debug!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        client = %addr,
        "Received prediction request"
    );

    if !extension_allowed(&upload.filename) {
        return Err(ApiError::UnsupportedFormat);
    }

    let vector = preprocess::normalize(&upload.bytes)?;

    let start = Instant::now();
    let prediction = state.classifier.infer(&vector)?;
    let elapsed = start.elapsed();

    state.telemetry.record_inference(elapsed, upload.bytes.len());
    state.telemetry.sample_host();

    info!(
        digit = prediction.digit,
        confidence = prediction.confidence,
        runtime_seconds = elapsed.as_secs_f64(),
        "Prediction complete"
    );

    Ok(Json(PredictResponse {
        digit: prediction.digit,
    }))
}

/// Pull the `uploaded_image` field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Upload { filename, bytes });
    }
    Err(ApiError::MissingImage)
}

/// Case-insensitive extension check against the accepted set.
///
/// This is a pure allow-list on the declared filename; whether the bytes
/// really are a decodable image is a separate, later failure condition.
fn extension_allowed(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
