//! Load worker implementation

use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::HarnessCallError;

/// Success body the endpoint returns
#[derive(Debug, Deserialize)]
struct PredictionBody {
    digit: u8,
}

/// Pick one pool entry uniformly at random.
pub(crate) fn pick<'a, R: Rng>(rng: &mut R, pool: &'a [String]) -> &'a str {
    &pool[rng.gen_range(0..pool.len())]
}

/// One synthetic client hammering the instance pool.
///
/// Workers are symmetric and fully independent: each iteration picks a
/// target uniformly at random from the whole pool, issues a single
/// prediction call, and sleeps the fixed delay. A failed call is logged
/// and the loop continues. No backoff and no retry within an iteration;
/// the fixed-interval repetition is deliberate load-generation behavior,
/// not resilience engineering.
pub struct LoadWorker {
    id: usize,
    client: reqwest::Client,
    pool: Arc<[String]>,
    image: Arc<Vec<u8>>,
    filename: String,
    delay: Duration,
}

impl LoadWorker {
    pub(crate) fn new(
        id: usize,
        client: reqwest::Client,
        pool: Arc<[String]>,
        image: Arc<Vec<u8>>,
        filename: String,
        delay: Duration,
    ) -> Self {
        Self {
            id,
            client,
            pool,
            image,
            filename,
            delay,
        }
    }

    /// Run the request loop until the stop signal flips.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        info!(worker = self.id, "Load worker started");

        while !*stop.borrow() {
            let target = {
                let mut rng = rand::thread_rng();
                pick(&mut rng, &self.pool).to_string()
            };

            match self.call_once(&target).await {
                Ok(digit) => {
                    info!(worker = self.id, target = %target, digit, "Prediction call succeeded");
                }
                Err(e) => {
                    warn!(worker = self.id, target = %target, "Call failed: {e}");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = stop.changed() => {}
            }
        }

        info!(worker = self.id, "Load worker stopped");
    }

    /// Issue one prediction call against `addr`.
    async fn call_once(&self, addr: &str) -> Result<u8, HarnessCallError> {
        let part = reqwest::multipart::Part::bytes(self.image.as_ref().clone())
            .file_name(self.filename.clone());
        let form = reqwest::multipart::Form::new().part("uploaded_image", part);

        let response = self
            .client
            .post(format!("http://{addr}/predict"))
            .multipart(form)
            .send()
            .await
            .map_err(|source| HarnessCallError::Request {
                addr: addr.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarnessCallError::BadStatus {
                addr: addr.to_string(),
                status,
            });
        }

        let body: PredictionBody =
            response
                .json()
                .await
                .map_err(|source| HarnessCallError::BadResponse {
                    addr: addr.to_string(),
                    source,
                })?;

        debug!(worker = self.id, target = %addr, digit = body.digit, "Decoded prediction");
        Ok(body.digit)
    }
}
