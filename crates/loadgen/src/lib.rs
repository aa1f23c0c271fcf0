//! Load Generation Harness
//!
//! Hammers a pool of digit-recognition endpoint instances with sustained
//! concurrent traffic: one worker per configured address, each picking its
//! target uniformly at random from the full pool on every iteration.

mod config;
mod coordinator;
mod worker;

pub use config::HarnessConfig;
pub use coordinator::LoadCoordinator;
pub use worker::LoadWorker;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Fatal errors while bringing up the harness.
///
/// Once workers are running nothing is fatal anymore; per-iteration
/// failures are [`HarnessCallError`]s and stay inside their iteration.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Instance pool is empty; configure at least one address")]
    EmptyPool,
    #[error("Invalid inter-call delay: {0} seconds")]
    InvalidDelay(f64),
    #[error("Failed to read sample image {path}: {source}")]
    SampleImage {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Failures of a single worker iteration. Logged and swallowed; the loop
/// simply moves on to its next pick after the fixed delay.
#[derive(Debug, Error)]
pub enum HarnessCallError {
    #[error("Request to {addr} failed: {source}")]
    Request {
        addr: String,
        source: reqwest::Error,
    },
    #[error("{addr} returned status {status}")]
    BadStatus {
        addr: String,
        status: reqwest::StatusCode,
    },
    #[error("Undecodable response from {addr}: {source}")]
    BadResponse {
        addr: String,
        source: reqwest::Error,
    },
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
