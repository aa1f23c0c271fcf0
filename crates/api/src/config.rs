//! Server configuration

use serde::Deserialize;

/// Server configuration, layered from `digit-server.toml` (optional) and
/// `DIGIT_SERVER_*` environment variables over the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Path to the frozen ONNX digit model
    pub model_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            model_path: "models/mnist.onnx".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("digit-server").required(false))
            .add_source(config::Environment::with_prefix("DIGIT_SERVER"))
            .build()?
            .try_deserialize()
    }
}
