//! Wire types for the image-edit HTTP surface
//!
//! Request/response bodies shared between the server, the client adapter and
//! the web UI, plus the ports and validation bounds both sides agree on.

use serde::{Deserialize, Serialize};

/// Default port the edit server listens on
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Default host the edit server binds
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Fixed port the web UI listens on when run standalone
pub const WEBUI_PORT: u16 = 30700;

/// Inclusive lower bound for `guidance_scale`
pub const GUIDANCE_SCALE_MIN: f32 = 0.1;

/// Inclusive upper bound for `guidance_scale`
pub const GUIDANCE_SCALE_MAX: f32 = 10.0;

/// Default `guidance_scale` when the request omits it
pub const GUIDANCE_SCALE_DEFAULT: f32 = 2.5;

/// Body of `POST /edit_image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditImageRequest {
    /// Base64-encoded PNG bytes of the input image
    pub image_base64: String,
    /// Edit instruction, e.g. "add a hat"
    pub prompt: String,
    /// How closely the edit follows the prompt
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
}

fn default_guidance_scale() -> f32 {
    GUIDANCE_SCALE_DEFAULT
}

/// Body of a successful `POST /edit_image` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditImageResponse {
    /// Base64-encoded PNG bytes of the edited image
    pub result: String,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    /// Currently equal to `model_loaded`; kept separate so readiness can
    /// grow extra conditions without a wire change
    pub ready: bool,
}

/// Body of `GET /model_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model_name: String,
    pub model_path: String,
    pub device: String,
    pub torch_dtype: String,
    pub loaded: bool,
}

/// Error body returned by the server for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
