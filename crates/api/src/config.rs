//! Server configuration
//!
//! All options come from the environment: `MODEL_PATH`, `DEVICE`,
//! `TORCH_DTYPE`, `LOG_LEVEL`, `SERVER_HOST`, `SERVER_PORT`.

use std::path::PathBuf;

use edit_engine::{EngineConfig, Precision, DEFAULT_MODEL_PATH};
use protocol::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT};
use serde::Deserialize;

/// Server configuration, deserialized from the process environment
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host the HTTP listener binds
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Port the HTTP listener binds
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Location of the model weights
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Explicit compute device; auto-detected when unset
    #[serde(default)]
    pub device: Option<String>,

    /// Numeric precision for the pipeline
    #[serde(default)]
    pub torch_dtype: Precision,

    /// Log level for the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            model_path: default_model_path(),
            device: None,
            torch_dtype: Precision::default(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// The engine's slice of this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model_path: self.model_path.clone(),
            device_override: self.device.clone(),
            precision: self.torch_dtype,
        }
    }

    /// Bind address for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server_port, 8888);
        assert_eq!(config.torch_dtype, Precision::Bfloat16);
        assert_eq!(config.bind_addr(), "0.0.0.0:8888");
    }

    #[test]
    fn test_unknown_dtype_is_rejected() {
        let result: Result<ServerConfig, _> =
            serde_json::from_str(r#"{"torch_dtype": "float8"}"#);
        assert!(result.is_err());
    }
}
