use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use faqrag::config::Config;
use faqrag::engine::RagEngine;
use faqrag::server::{AppState, ChatServer};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "FAQ chat backend with TF-IDF retrieval and Gemini answers")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Build the index at startup instead of on the first question
    #[arg(long)]
    warm: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Load config
    let mut config = Config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    let config = Arc::new(config);

    // 2. Engine (initialized lazily unless warmed)
    let engine = Arc::new(RagEngine::with_gemini(config.clone()));
    if cli.warm && !engine.initialize().await {
        warn!("Warm-up failed; will retry on the first question");
    }

    // 3. Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Starting faqrag v{}", env!("CARGO_PKG_VERSION"));
    ChatServer::new(AppState::new(engine))
        .start(listener, shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
