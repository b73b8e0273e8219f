//! Image edit route

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use protocol::{EditImageRequest, EditImageResponse, GUIDANCE_SCALE_MAX, GUIDANCE_SCALE_MIN};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// `POST /edit_image`
///
/// Validation comes first and never touches the engine; readiness is checked
/// before the image is decoded. The engine serializes the pipeline call
/// itself.
pub async fn edit_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EditImageRequest>,
) -> Result<Json<EditImageResponse>, ApiError> {
    if request.image_base64.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "image_base64 cannot be empty".to_string(),
        ));
    }
    if request.prompt.trim().is_empty() {
        return Err(ApiError::InvalidArgument("prompt cannot be empty".to_string()));
    }
    if !(GUIDANCE_SCALE_MIN..=GUIDANCE_SCALE_MAX).contains(&request.guidance_scale) {
        return Err(ApiError::InvalidArgument(format!(
            "guidance_scale must be between {GUIDANCE_SCALE_MIN} and {GUIDANCE_SCALE_MAX}"
        )));
    }

    if !state.engine.is_loaded() {
        return Err(ApiError::NotReady(
            "Model not loaded. Please retry shortly.".to_string(),
        ));
    }

    let input = image_codec::decode_png_base64(&request.image_base64)
        .map_err(|e| ApiError::InvalidArgument(format!("malformed image data: {e}")))?;

    info!("processing edit request: '{}'", request.prompt);
    let edited = state
        .engine
        .edit(&input, &request.prompt, request.guidance_scale)
        .await?;

    let result = image_codec::encode_png_base64(&edited)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(EditImageResponse { result }))
}
