//! Web UI for the image-edit service
//!
//! A thin front-end process that talks to the persistent server over HTTP via
//! the client adapter. It owns no state beyond the last-fetched health
//! snapshot the page displays; every edit is forwarded to the service.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use edit_client::{ClientError, EditClient};
use protocol::{
    EditImageRequest, EditImageResponse, ErrorBody, HealthResponse, ModelInfoResponse,
    DEFAULT_SERVER_PORT, WEBUI_PORT,
};
use serde::Deserialize;
use tracing::{info, Level};

/// Web UI configuration, read from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct WebuiConfig {
    /// Base URL of the edit server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Log level for the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    format!("http://localhost:{DEFAULT_SERVER_PORT}")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WebuiConfig {
    /// Read configuration from the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

/// State shared across UI handlers
pub struct WebuiState {
    /// Adapter for the persistent server
    pub client: EditClient,
}

/// Create the UI router
pub fn create_router(state: Arc<WebuiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(proxy_health))
        .route("/api/model_info", get(proxy_model_info))
        .route("/api/edit", post(proxy_edit))
        .with_state(state)
}

/// The embedded single-page UI
async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

/// Health of the backing server; reports not-ready when unreachable
async fn proxy_health(State(state): State<Arc<WebuiState>>) -> Json<HealthResponse> {
    let health = state.client.health().await.unwrap_or(HealthResponse {
        status: "unreachable".to_string(),
        model_loaded: false,
        ready: false,
    });
    Json(health)
}

/// Model info of the backing server
async fn proxy_model_info(
    State(state): State<Arc<WebuiState>>,
) -> Result<Json<ModelInfoResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.client.model_info().await {
        Some(info) => Ok(Json(info)),
        None => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                detail: "server unreachable".to_string(),
            }),
        )),
    }
}

/// Forward an edit to the server, relaying its error detail on failure
async fn proxy_edit(
    State(state): State<Arc<WebuiState>>,
    Json(request): Json<EditImageRequest>,
) -> Result<Json<EditImageResponse>, (StatusCode, Json<ErrorBody>)> {
    let result = state
        .client
        .edit_image_base64(&request.image_base64, &request.prompt, request.guidance_scale)
        .await;

    match result {
        Ok(result) => Ok(Json(EditImageResponse { result })),
        Err(ClientError::Server { status, detail }) => Err((
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(ErrorBody { detail }),
        )),
        Err(other) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                detail: other.to_string(),
            }),
        )),
    }
}

/// Initialize logging
pub fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Run the web UI on its fixed port until the process is stopped
pub async fn run_webui(config: &WebuiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(WebuiState {
        client: EditClient::new(config.server_url.clone()),
    });
    let app = create_router(state);
    let addr = format!("0.0.0.0:{WEBUI_PORT}");

    info!("Starting web UI on {} (server: {})", addr, config.server_url);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
