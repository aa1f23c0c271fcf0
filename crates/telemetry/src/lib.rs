//! Request Telemetry
//!
//! Owns every metric instrument the serving path updates and exposes a
//! read-only Prometheus text rendering for an external scrape collector.

mod recorder;

pub use recorder::{micros_per_byte, Telemetry};

/// Total requests received, labeled by caller address
pub const CLIENT_REQUESTS_TOTAL: &str = "client_requests_total";

/// Most recent inference duration in seconds
pub const INFERENCE_RUNTIME_SECONDS: &str = "inference_runtime_seconds";

/// Most recent per-input-byte processing time in microseconds
pub const PROCESSING_TIME_PER_BYTE_MICROSECONDS: &str = "processing_time_per_byte_microseconds";

/// Most recent observed cumulative host network receive bytes
pub const NETWORK_RECEIVE_BYTES: &str = "network_receive_bytes";

/// Most recent observed cumulative host network transmit bytes
pub const NETWORK_TRANSMIT_BYTES: &str = "network_transmit_bytes";

/// Most recent host memory utilization in percent
pub const MEMORY_UTILIZATION_PERCENT: &str = "memory_utilization_percent";

/// Most recent host CPU utilization in percent
pub const CPU_UTILIZATION_PERCENT: &str = "cpu_utilization_percent";
