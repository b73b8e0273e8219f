//! Engine configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default location of the model weights
pub const DEFAULT_MODEL_PATH: &str = "./models/black-forest-labs/FLUX.1-Kontext-dev";

/// Numeric precision the pipeline is loaded with
///
/// Wire names match the torch dtype strings the configuration and
/// `/model_info` use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    #[serde(rename = "bfloat16")]
    Bfloat16,
    #[serde(rename = "float16")]
    Float16,
    #[serde(rename = "float32")]
    Float32,
}

impl Precision {
    /// Get the torch dtype string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Bfloat16 => "bfloat16",
            Precision::Float16 => "float16",
            Precision::Float32 => "float32",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Location of the model weights on disk
    pub model_path: PathBuf,

    /// Explicit compute device, overriding auto-detection
    pub device_override: Option<String>,

    /// Numeric precision for the loaded pipeline
    pub precision: Precision,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            device_override: None,
            precision: Precision::default(),
        }
    }
}

impl EngineConfig {
    /// Model name reported by `/model_info`, taken from the path's final
    /// component
    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Pick the compute device: explicit override if configured, else an
    /// accelerator when one is visible, else the CPU
    pub fn resolve_device(&self) -> String {
        match &self.device_override {
            Some(device) => device.clone(),
            None if cuda_visible() => "cuda".to_string(),
            None => "cpu".to_string(),
        }
    }
}

/// Whether an NVIDIA device node is visible to this process
fn cuda_visible() -> bool {
    Path::new("/dev/nvidia0").exists() || Path::new("/dev/nvidiactl").exists()
}
