//! Load coordinator implementation

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{HarnessConfig, HarnessError, LoadWorker};

/// Per-call timeout; the only bound on a stuck iteration
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawns and owns the worker pool.
///
/// Pool size equals the configured address-list length, but every worker
/// still picks targets from the full list: parallelism and addressing are
/// decoupled. Workers share nothing mutable; the address list and sample
/// image are read-only once the coordinator is built.
pub struct LoadCoordinator {
    pool: Arc<[String]>,
    image: Arc<Vec<u8>>,
    filename: String,
    delay: Duration,
    client: reqwest::Client,
}

impl LoadCoordinator {
    /// Validate the configuration and load the sample image.
    ///
    /// Fails before any worker starts when the pool is empty, the delay is
    /// not a finite non-negative number, or the sample image is unreadable.
    pub fn new(config: &HarnessConfig) -> Result<Self, HarnessError> {
        if config.instance_urls.is_empty() {
            return Err(HarnessError::EmptyPool);
        }
        if !config.delay_seconds.is_finite() || config.delay_seconds < 0.0 {
            return Err(HarnessError::InvalidDelay(config.delay_seconds));
        }

        let image =
            std::fs::read(&config.sample_image_path).map_err(|source| HarnessError::SampleImage {
                path: config.sample_image_path.display().to_string(),
                source,
            })?;

        let filename = config
            .sample_image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("sample.png")
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .map_err(HarnessError::Client)?;

        info!(
            pool_size = config.instance_urls.len(),
            sample = %config.sample_image_path.display(),
            delay_seconds = config.delay_seconds,
            "Load coordinator ready"
        );

        Ok(Self {
            pool: config.instance_urls.clone().into(),
            image: Arc::new(image),
            filename,
            delay: Duration::from_secs_f64(config.delay_seconds),
            client,
        })
    }

    /// Number of workers this coordinator spawns
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Start one worker task per pool slot.
    ///
    /// Workers run until the stop signal flips; the caller keeps the
    /// sender side and the returned handles.
    pub fn spawn_workers(&self, stop: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        (0..self.pool.len())
            .map(|id| {
                let worker = LoadWorker::new(
                    id,
                    self.client.clone(),
                    self.pool.clone(),
                    self.image.clone(),
                    self.filename.clone(),
                    self.delay,
                );
                tokio::spawn(worker.run(stop.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_image_on_disk(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("loadgen-{}-{name}", std::process::id()));
        std::fs::write(&path, b"fixture image bytes").unwrap();
        path
    }

    #[test]
    fn test_empty_pool_rejected() {
        let config = HarnessConfig {
            instance_urls: vec![],
            ..HarnessConfig::default()
        };

        let result = LoadCoordinator::new(&config);
        assert!(matches!(result, Err(HarnessError::EmptyPool)));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = HarnessConfig {
            delay_seconds: -0.5,
            sample_image_path: sample_image_on_disk("delay.png"),
            ..HarnessConfig::default()
        };

        let result = LoadCoordinator::new(&config);
        assert!(matches!(result, Err(HarnessError::InvalidDelay(_))));
        std::fs::remove_file(config.sample_image_path).ok();
    }

    #[test]
    fn test_missing_sample_image_rejected() {
        let config = HarnessConfig {
            sample_image_path: PathBuf::from("/nonexistent/sample.png"),
            ..HarnessConfig::default()
        };

        let result = LoadCoordinator::new(&config);
        assert!(matches!(result, Err(HarnessError::SampleImage { .. })));
    }

    #[test]
    fn test_pool_size_matches_address_list() {
        let path = sample_image_on_disk("pool.png");
        let config = HarnessConfig {
            instance_urls: vec![
                "localhost:8000".to_string(),
                "localhost:8001".to_string(),
                "localhost:8002".to_string(),
            ],
            delay_seconds: 0.1,
            sample_image_path: path.clone(),
        };

        let coordinator = LoadCoordinator::new(&config).unwrap();
        assert_eq!(coordinator.pool_size(), 3);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_spawns_one_worker_per_slot_and_stops_them() {
        let path = sample_image_on_disk("spawn.png");
        let config = HarnessConfig {
            instance_urls: vec!["127.0.0.1:9".to_string(), "127.0.0.1:9".to_string()],
            delay_seconds: 0.005,
            sample_image_path: path.clone(),
        };
        let coordinator = LoadCoordinator::new(&config).unwrap();

        let (stop_tx, stop_rx) = watch::channel(false);
        let workers = coordinator.spawn_workers(&stop_rx);
        assert_eq!(workers.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();
        for worker in workers {
            tokio::time::timeout(Duration::from_secs(5), worker)
                .await
                .expect("worker should stop promptly")
                .unwrap();
        }
        std::fs::remove_file(path).ok();
    }
}
