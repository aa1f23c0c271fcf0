//! Digit Recognition Service - Main Entry Point

use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Digit Recognition API v{} ===", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load()?;
    run_server(&config).await?;

    Ok(())
}
