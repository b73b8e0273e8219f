//! Persistent Image Edit Server - Main Entry Point

use api::{init_logging, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level);

    info!("=== Pixedit Server v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model path: {}", config.model_path.display());
    info!(
        "Device: {}",
        config.device.as_deref().unwrap_or("auto-detect")
    );

    api::run(&config).await
}
