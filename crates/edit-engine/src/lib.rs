//! Image Edit Engine
//!
//! Owns the lifecycle of the expensive, device-bound edit pipeline: load-once
//! semantics, a lock-free readiness flag, and an exclusive-access gate that
//! serializes every transformation through the single loaded pipeline.

mod config;
mod engine;
mod pipeline;

pub use config::{EngineConfig, Precision, DEFAULT_MODEL_PATH};
pub use engine::{EditEngine, EngineInfo};
pub use pipeline::{EditPipeline, PassthroughLoader, PipelineLoader};

use thiserror::Error;

/// Errors from the edit engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Model not loaded")]
    NotLoaded,
    #[error("Image edit failed: {0}")]
    EditFailed(String),
}
