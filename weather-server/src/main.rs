//! Binary crate for the weather HTTP service.
//!
//! This crate focuses on:
//! - Parsing command-line arguments
//! - Wiring configuration into the upstream clients
//! - Serving the `/weather` route

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_core::Config;

mod routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather HTTP API")]
struct Args {
    /// Socket address to bind, e.g. "127.0.0.1:8080"; overrides the config file.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_server=info,weather_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let bind_addr = args.bind.unwrap_or(config.server.bind_addr);

    let state = Arc::new(routes::AppState::from_config(&config)?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
