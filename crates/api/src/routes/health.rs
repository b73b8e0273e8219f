//! Health and model-info routes
//!
//! Both read only the engine's atomic readiness flag, never the gate, so
//! they answer even while an edit is in flight.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use protocol::{HealthResponse, ModelInfoResponse};

use crate::AppState;

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = state.engine.is_loaded();
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: loaded,
        ready: loaded,
    })
}

/// `GET /model_info`
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let info = state.engine.describe();
    Json(ModelInfoResponse {
        model_name: info.model_name,
        model_path: info.model_path.display().to_string(),
        device: info.device,
        torch_dtype: info.precision.as_str().to_string(),
        loaded: info.loaded,
    })
}
