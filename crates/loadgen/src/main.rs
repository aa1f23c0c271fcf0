//! Load Harness - Main Entry Point

use loadgen::{init_logging, HarnessConfig, LoadCoordinator};
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!(
        "=== Digit Recognition Load Harness v{} ===",
        env!("CARGO_PKG_VERSION")
    );

    let config = HarnessConfig::load()?;
    let coordinator = LoadCoordinator::new(&config)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let workers = coordinator.spawn_workers(&stop_rx);
    info!("Spawned {} load workers; Ctrl-C to stop", workers.len());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping workers");
    let _ = stop_tx.send(true);

    for worker in workers {
        let _ = worker.await;
    }

    Ok(())
}
