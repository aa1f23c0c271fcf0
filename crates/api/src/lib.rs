//! Digit Recognition API Server
//!
//! HTTP inference endpoint: accepts an uploaded digit image, runs the
//! frozen MNIST classifier, and records per-request telemetry for an
//! external Prometheus scrape.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use inference_engine::DigitClassifier;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use telemetry::Telemetry;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::predict::PredictResponse;

/// Application state shared across handlers
pub struct AppState {
    /// Frozen digit classifier; concurrent reads need no lock
    pub classifier: DigitClassifier,
    /// Metric instruments
    pub telemetry: Telemetry,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(classifier: DigitClassifier, telemetry: Telemetry) -> Self {
        Self {
            classifier,
            telemetry,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model_path: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(routes::predict::predict))
        .route("/metrics", get(routes::metrics::render))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model_path: state.classifier.model_path().to_string(),
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Load the model and serve until the process is terminated.
///
/// Model loading happens before the listener binds; a missing or corrupt
/// artifact aborts startup.
pub async fn run_server(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = DigitClassifier::load(&config.model_path)?;
    let state = Arc::new(AppState::new(classifier, Telemetry::new()));
    let app = create_router(state);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
