//! Pipeline boundary
//!
//! The diffusion backend is an external collaborator; these traits are the
//! whole of its contract. `PipelineLoader::load` is the expensive one-time
//! init step, `EditPipeline::apply` the per-request transformation.

use image::DynamicImage;
use tracing::info;

use crate::{EngineConfig, EngineError};

/// A loaded, device-bound edit pipeline
///
/// Implementations are not required to be safe for concurrent use; the
/// engine guarantees at most one `apply` call is in flight at a time.
pub trait EditPipeline: Send + std::fmt::Debug {
    /// Run one edit: transform `image` according to `prompt`
    fn apply(
        &mut self,
        image: &DynamicImage,
        prompt: &str,
        guidance_scale: f32,
    ) -> Result<DynamicImage, EngineError>;
}

/// Factory for the expensive load/init step of a pipeline backend
pub trait PipelineLoader: Send + Sync {
    /// Load the pipeline onto `device`. Blocking and potentially very slow.
    fn load(
        &self,
        config: &EngineConfig,
        device: &str,
    ) -> Result<Box<dyn EditPipeline>, EngineError>;
}

/// Development backend: returns the input image unchanged
///
/// Stands in for the diffusion pipeline on hosts without the model weights.
/// The HTTP surface, the gate and the process lifecycle behave exactly as
/// with a real backend.
pub struct PassthroughLoader;

impl PipelineLoader for PassthroughLoader {
    fn load(
        &self,
        config: &EngineConfig,
        device: &str,
    ) -> Result<Box<dyn EditPipeline>, EngineError> {
        if !config.model_path.exists() {
            return Err(EngineError::ModelLoadError(format!(
                "model not found at {}",
                config.model_path.display()
            )));
        }

        info!(
            "passthrough pipeline ready on {} ({})",
            device, config.precision
        );
        Ok(Box::new(PassthroughPipeline))
    }
}

#[derive(Debug)]
struct PassthroughPipeline;

impl EditPipeline for PassthroughPipeline {
    fn apply(
        &mut self,
        image: &DynamicImage,
        _prompt: &str,
        _guidance_scale: f32,
    ) -> Result<DynamicImage, EngineError> {
        Ok(image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_rejects_missing_model_path() {
        let config = EngineConfig {
            model_path: "/nonexistent/model".into(),
            ..Default::default()
        };
        let err = PassthroughLoader.load(&config, "cpu").unwrap_err();
        assert!(matches!(err, EngineError::ModelLoadError(_)));
        assert!(err.to_string().contains("/nonexistent/model"));
    }

    #[test]
    fn test_passthrough_echoes_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            model_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut pipeline = PassthroughLoader.load(&config, "cpu").unwrap();

        let image = DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        let edited = pipeline.apply(&image, "add a hat", 2.5).unwrap();
        assert_eq!(image.to_rgba8(), edited.to_rgba8());
    }
}
