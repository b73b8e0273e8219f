//! Edit Engine Implementation

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Instant;

use image::DynamicImage;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{EngineConfig, EngineError, PipelineLoader, Precision};

/// Read-only projection of engine state for `/model_info`
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub model_name: String,
    pub model_path: PathBuf,
    pub device: String,
    pub precision: Precision,
    pub loaded: bool,
}

/// The process-wide edit engine
///
/// Constructed exactly once per service process and shared by reference.
/// The loaded pipeline sits behind a tokio `Mutex` (the gate), so at most
/// one edit runs inside the pipeline at a time; concurrent callers queue in
/// arrival order. Readiness is a separate atomic flag so health checks never
/// wait behind a long-running edit.
pub struct EditEngine {
    config: EngineConfig,
    device: String,
    loader: Box<dyn PipelineLoader>,
    pipeline: Mutex<Option<Box<dyn crate::EditPipeline>>>,
    loaded: AtomicBool,
    load_error: StdMutex<Option<String>>,
}

impl EditEngine {
    /// Create the engine. Does not load the pipeline; call [`load`](Self::load).
    pub fn new(config: EngineConfig, loader: Box<dyn PipelineLoader>) -> Self {
        let device = config.resolve_device();
        info!(
            "creating edit engine: model={} device={} precision={}",
            config.model_path.display(),
            device,
            config.precision
        );
        Self {
            config,
            device,
            loader,
            pipeline: Mutex::new(None),
            loaded: AtomicBool::new(false),
            load_error: StdMutex::new(None),
        }
    }

    /// Load the pipeline
    ///
    /// A second call while already loaded is a no-op. A call after a failed
    /// attempt retries from scratch; the loader hands over the pipeline by
    /// value, so a failure leaves no partial state behind.
    pub async fn load(&self) -> Result<(), EngineError> {
        let mut slot = self.pipeline.lock().await;
        if slot.is_some() {
            debug!("model already loaded, skipping");
            return Ok(());
        }

        info!(
            "loading model from {} on {}",
            self.config.model_path.display(),
            self.device
        );
        let started = Instant::now();

        let result =
            tokio::task::block_in_place(|| self.loader.load(&self.config, &self.device));
        match result {
            Ok(pipeline) => {
                *slot = Some(pipeline);
                *self.load_error.lock().unwrap() = None;
                self.loaded.store(true, Ordering::Release);
                info!("model loaded in {:.1}s", started.elapsed().as_secs_f64());
                Ok(())
            }
            Err(e) => {
                error!("failed to load model: {e}");
                *self.load_error.lock().unwrap() = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Run one edit through the pipeline
    ///
    /// Takes the gate for the duration of the transformation. Input
    /// validation belongs to the caller; requests must not reach this point
    /// unless their fields already passed.
    pub async fn edit(
        &self,
        image: &DynamicImage,
        prompt: &str,
        guidance_scale: f32,
    ) -> Result<DynamicImage, EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotLoaded);
        }

        let mut slot = self.pipeline.lock().await;
        let pipeline = slot.as_mut().ok_or(EngineError::NotLoaded)?;

        let started = Instant::now();
        let edited =
            tokio::task::block_in_place(|| pipeline.apply(image, prompt, guidance_scale))?;
        debug!("edit completed in {}ms", started.elapsed().as_millis());
        Ok(edited)
    }

    /// Whether the pipeline has finished loading. Never takes the gate.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Detail of the last failed load attempt, if any
    pub fn last_load_error(&self) -> Option<String> {
        self.load_error.lock().unwrap().clone()
    }

    /// Read-only projection of engine state plus static configuration
    pub fn describe(&self) -> EngineInfo {
        EngineInfo {
            model_name: self.config.model_name(),
            model_path: self.config.model_path.clone(),
            device: self.device.clone(),
            precision: self.config.precision,
            loaded: self.is_loaded(),
        }
    }
}
