//! Request error taxonomy and HTTP status mapping

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use inference_engine::InferenceError;
use preprocess::PreprocessError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by the predict endpoint.
///
/// Every variant is local to one request; no retry happens anywhere in the
/// handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad file format. Accepted formats are .jpeg, .jpg, .png")]
    UnsupportedFormat,
    #[error("Multipart field `uploaded_image` is required")]
    MissingImage,
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedFormat | ApiError::MissingImage | ApiError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Preprocess(_) | ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!("Request failed: {detail}");
        } else {
            warn!("Request rejected: {detail}");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(ApiError::UnsupportedFormat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingImage.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pipeline_errors_map_to_500() {
        let decode = ApiError::Preprocess(
            preprocess::normalize(b"not an image").unwrap_err(),
        );
        assert_eq!(decode.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let inference = ApiError::Inference(InferenceError::ExecutionFailed("boom".into()));
        assert_eq!(inference.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
