//! Metric recorder implementation

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{Networks, System};
use tracing::debug;

use crate::{
    CLIENT_REQUESTS_TOTAL, CPU_UTILIZATION_PERCENT, INFERENCE_RUNTIME_SECONDS,
    MEMORY_UTILIZATION_PERCENT, NETWORK_RECEIVE_BYTES, NETWORK_TRANSMIT_BYTES,
    PROCESSING_TIME_PER_BYTE_MICROSECONDS,
};

/// Derived per-byte processing time in microseconds.
///
/// Returns 0.0 for an empty upload rather than dividing by zero.
pub fn micros_per_byte(elapsed: Duration, upload_len: usize) -> f64 {
    if upload_len == 0 {
        return 0.0;
    }
    elapsed.as_secs_f64() * 1e6 / upload_len as f64
}

/// Process-wide metric instruments, created once at startup.
///
/// Each individual update is a single atomic set or increment; there is no
/// cross-metric transaction, so a scrape between two concurrent requests may
/// observe a mix of old and new gauge values. The instance owns its own
/// recorder rather than installing a process-global one, which keeps tests
/// independent and makes the export surface (`render`) explicit.
pub struct Telemetry {
    recorder: PrometheusRecorder,
    host: Mutex<HostSampler>,
}

impl Telemetry {
    /// Create the instrument set
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let telemetry = Self {
            recorder,
            host: Mutex::new(HostSampler::new()),
        };
        telemetry.describe();
        telemetry
    }

    /// Count one received request for `client_ip`.
    ///
    /// Called on receipt, before any validation, so rejected requests are
    /// still counted.
    pub fn record_request(&self, client_ip: &str) {
        let ip = client_ip.to_string();
        self.scoped(|| counter!(CLIENT_REQUESTS_TOTAL, "client_ip" => ip).increment(1));
    }

    /// Record one completed inference: runtime gauge plus the derived
    /// per-upload-byte processing time. Last write wins.
    pub fn record_inference(&self, elapsed: Duration, upload_len: usize) {
        let per_byte = micros_per_byte(elapsed, upload_len);
        self.scoped(|| {
            gauge!(INFERENCE_RUNTIME_SECONDS).set(elapsed.as_secs_f64());
            gauge!(PROCESSING_TIME_PER_BYTE_MICROSECONDS).set(per_byte);
        });
        debug!(
            runtime_seconds = elapsed.as_secs_f64(),
            per_byte_micros = per_byte,
            "Recorded inference timing"
        );
    }

    /// Snapshot cumulative host network counters and resource utilization
    /// into their gauges. Each value overwrites the previous sample.
    pub fn sample_host(&self) {
        let snapshot = {
            let mut host = match self.host.lock() {
                Ok(guard) => guard,
                // A panic while sampling poisons the lock; keep serving with
                // the inner sampler as-is.
                Err(poisoned) => poisoned.into_inner(),
            };
            host.sample()
        };

        self.scoped(|| {
            gauge!(NETWORK_RECEIVE_BYTES).set(snapshot.received_bytes as f64);
            gauge!(NETWORK_TRANSMIT_BYTES).set(snapshot.transmitted_bytes as f64);
            gauge!(MEMORY_UTILIZATION_PERCENT).set(snapshot.memory_percent);
            gauge!(CPU_UTILIZATION_PERCENT).set(snapshot.cpu_percent);
        });
    }

    /// Render all instruments in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }

    fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }

    fn describe(&self) {
        self.scoped(|| {
            describe_counter!(CLIENT_REQUESTS_TOTAL, "Total number of API requests");
            describe_gauge!(INFERENCE_RUNTIME_SECONDS, "Time taken for inference in seconds");
            describe_gauge!(
                PROCESSING_TIME_PER_BYTE_MICROSECONDS,
                "Processing time per input byte in microseconds"
            );
            describe_gauge!(NETWORK_RECEIVE_BYTES, "Total network receive bytes");
            describe_gauge!(NETWORK_TRANSMIT_BYTES, "Total network transmit bytes");
            describe_gauge!(MEMORY_UTILIZATION_PERCENT, "Host memory utilization in percent");
            describe_gauge!(CPU_UTILIZATION_PERCENT, "Host CPU utilization in percent");
        });
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Host resource snapshot
struct HostSnapshot {
    received_bytes: u64,
    transmitted_bytes: u64,
    memory_percent: f64,
    cpu_percent: f64,
}

/// Wraps sysinfo's refreshable system and network state
struct HostSampler {
    system: System,
    networks: Networks,
}

impl HostSampler {
    fn new() -> Self {
        Self {
            system: System::new(),
            networks: Networks::new_with_refreshed_list(),
        }
    }

    fn sample(&mut self) -> HostSnapshot {
        self.networks.refresh();
        let (received_bytes, transmitted_bytes) = self
            .networks
            .iter()
            .fold((0u64, 0u64), |(rx, tx), (_name, data)| {
                (rx + data.total_received(), tx + data.total_transmitted())
            });

        self.system.refresh_memory();
        self.system.refresh_cpu_usage();

        let memory_percent = if self.system.total_memory() > 0 {
            self.system.used_memory() as f64 / self.system.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        HostSnapshot {
            received_bytes,
            transmitted_bytes,
            memory_percent,
            cpu_percent: f64::from(self.system.global_cpu_info().cpu_usage()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_counter_renders_per_caller() {
        let telemetry = Telemetry::new();
        telemetry.record_request("10.0.0.1");
        telemetry.record_request("10.0.0.1");
        telemetry.record_request("10.0.0.2");

        let rendered = telemetry.render();
        assert!(rendered.contains(CLIENT_REQUESTS_TOTAL));
        assert!(rendered.contains(r#"client_ip="10.0.0.1""#));
        assert!(rendered.contains(r#"client_ip="10.0.0.2""#));
    }

    #[test]
    fn test_inference_gauges_overwrite() {
        let telemetry = Telemetry::new();
        telemetry.record_inference(Duration::from_millis(20), 1000);
        telemetry.record_inference(Duration::from_millis(10), 1000);

        let rendered = telemetry.render();
        // Last write wins: 10ms, not 20ms
        assert!(rendered.contains(INFERENCE_RUNTIME_SECONDS));
        assert!(rendered.contains("0.01"));
        assert!(rendered.contains(PROCESSING_TIME_PER_BYTE_MICROSECONDS));
    }

    #[test]
    fn test_host_sample_populates_gauges() {
        let telemetry = Telemetry::new();
        telemetry.sample_host();

        let rendered = telemetry.render();
        assert!(rendered.contains(NETWORK_RECEIVE_BYTES));
        assert!(rendered.contains(NETWORK_TRANSMIT_BYTES));
        assert!(rendered.contains(MEMORY_UTILIZATION_PERCENT));
        assert!(rendered.contains(CPU_UTILIZATION_PERCENT));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = Telemetry::new();
        let second = Telemetry::new();
        first.record_request("10.0.0.9");

        assert!(first.render().contains(r#"client_ip="10.0.0.9""#));
        assert!(!second.render().contains(r#"client_ip="10.0.0.9""#));
    }

    #[test]
    fn test_micros_per_byte() {
        let per_byte = micros_per_byte(Duration::from_micros(500), 100);
        assert!((per_byte - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_micros_per_byte_empty_upload() {
        assert_eq!(micros_per_byte(Duration::from_secs(1), 0), 0.0);
    }
}
