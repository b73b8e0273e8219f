//! Web UI - Main Entry Point

use webui::{init_logging, run_webui, WebuiConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WebuiConfig::from_env()?;
    init_logging(&config.log_level);
    run_webui(&config).await
}
