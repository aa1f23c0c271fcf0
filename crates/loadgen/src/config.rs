//! Harness configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Harness configuration, layered from `loadgen.toml` (optional) and
/// `LOADGEN_*` environment variables over the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Endpoint instances to target, as `host:port`
    pub instance_urls: Vec<String>,
    /// Fixed delay between calls in seconds
    pub delay_seconds: f64,
    /// Image posted on every call
    pub sample_image_path: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            instance_urls: vec!["localhost:8000".to_string(), "localhost:8001".to_string()],
            delay_seconds: 1.0,
            sample_image_path: PathBuf::from("samples/0.png"),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("loadgen").required(false))
            .add_source(config::Environment::with_prefix("LOADGEN"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.instance_urls.len(), 2);
        assert!((config.delay_seconds - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.sample_image_path, PathBuf::from("samples/0.png"));
    }
}
