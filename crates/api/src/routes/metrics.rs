//! Metrics scrape route

use axum::extract::State;
use std::sync::Arc;

use crate::AppState;

/// Render every instrument in Prometheus text exposition format.
///
/// Read-only: scraping never mutates telemetry state.
pub async fn render(State(state): State<Arc<AppState>>) -> String {
    state.telemetry.render()
}
