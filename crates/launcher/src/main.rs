//! Pixedit Launcher
//!
//! Brings up the persistent edit server, waits for it to become ready, then
//! starts the web UI, and tears both down coherently on exit. Also offers
//! single-process modes and quick health/dependency checks.

use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::{Parser, Subcommand};
use edit_client::EditClient;
use edit_engine::DEFAULT_MODEL_PATH;
use protocol::{DEFAULT_SERVER_PORT, WEBUI_PORT};
use supervisor::{Supervisor, SupervisorConfig};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "pixedit", version, about = "AI image editor with a persistent edit server")]
struct Cli {
    /// Base URL of the edit server
    #[arg(long, env = "SERVER_URL", default_value_t = default_server_url())]
    server_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the persistent edit server in the foreground
    Server,
    /// Start the web UI (the server must already be healthy)
    Webui,
    /// Start server and web UI together with supervision (default)
    Both,
    /// Verify the model and the sibling binaries are present
    Check,
    /// Query server health; exit 0 when ready
    Status,
}

fn default_server_url() -> String {
    format!("http://localhost:{DEFAULT_SERVER_PORT}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber_init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Both) {
        Command::Server => cmd_server().await,
        Command::Webui => cmd_webui(&cli.server_url).await,
        Command::Both => cmd_both(&cli.server_url).await,
        Command::Check => {
            if !check_system() {
                exit(1);
            }
            println!("everything looks good");
            Ok(())
        }
        Command::Status => cmd_status(&cli.server_url).await,
    }
}

fn tracing_subscriber_init() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Model weights plus the two sibling binaries the supervisor spawns
fn check_system() -> bool {
    let mut ok = true;

    let model_path = std::env::var("MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));
    if model_path.exists() {
        println!("model found at {}", model_path.display());
    } else {
        eprintln!(
            "model not found at {} (set MODEL_PATH)",
            model_path.display()
        );
        ok = false;
    }

    for name in ["pixedit-server", "pixedit-webui"] {
        match sibling_binary(name) {
            Ok(path) if path.exists() => println!("found {}", path.display()),
            Ok(path) => {
                eprintln!("missing binary {}", path.display());
                ok = false;
            }
            Err(e) => {
                eprintln!("cannot locate {name}: {e}");
                ok = false;
            }
        }
    }

    ok
}

/// Resolve a binary installed next to the launcher itself
fn sibling_binary(name: &str) -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate launcher executable")?;
    let dir = exe
        .parent()
        .context("launcher executable has no parent directory")?;
    Ok(dir.join(name))
}

async fn cmd_server() -> anyhow::Result<()> {
    let config = api::ServerConfig::from_env().context("invalid server configuration")?;
    info!("Model path: {}", config.model_path.display());
    api::run(&config).await.map_err(|e| anyhow::anyhow!("{e}"))
}

async fn cmd_webui(server_url: &str) -> anyhow::Result<()> {
    let client = EditClient::new(server_url);
    if !client.is_ready().await {
        eprintln!("server not running at {server_url}, start it first: pixedit server");
        exit(1);
    }

    let mut config = webui::WebuiConfig::from_env().context("invalid web UI configuration")?;
    config.server_url = server_url.to_string();
    webui::run_webui(&config).await.map_err(|e| anyhow::anyhow!("{e}"))
}

async fn cmd_status(server_url: &str) -> anyhow::Result<()> {
    let client = EditClient::new(server_url);
    match client.health().await {
        Some(health) if health.ready => {
            println!("server is running and ready");
            Ok(())
        }
        Some(_) => {
            println!("server is running but the model is not loaded yet");
            exit(1);
        }
        None => {
            println!("server not running at {server_url}");
            exit(1);
        }
    }
}

async fn cmd_both(server_url: &str) -> anyhow::Result<()> {
    if !check_system() {
        exit(1);
    }

    let mut config = SupervisorConfig::new(
        sibling_binary("pixedit-server")?,
        sibling_binary("pixedit-webui")?,
    );
    config.server_url = server_url.to_string();

    let mut sup = Supervisor::new(config);
    sup.spawn_service()?;

    if let Err(e) = sup.await_ready().await {
        error!("server failed to start: {e}");
        sup.shutdown().await;
        exit(1);
    }

    sup.spawn_client()?;
    info!("system ready");
    info!("server: {server_url} (model loaded)");
    info!("web UI: http://localhost:{WEBUI_PORT}");
    info!("press Ctrl+C to stop everything");

    if let Err(e) = sup.run().await {
        error!("{e}");
        exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_both() {
        let cli = Cli::parse_from(["pixedit"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.server_url, default_server_url());
    }
}
