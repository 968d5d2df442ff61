//! ts-injector - Tailscale sidecar injection webhook

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ts_injector::config::Config;
use ts_injector::server::start_server;
use ts_injector::webhook::WebhookState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install crypto provider before any TLS config is built
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        anyhow::bail!("failed to install aws-lc-rs crypto provider: {:?}", e);
    }

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::parse();

    tracing::info!(
        port = config.port,
        image = %config.image,
        secret_pattern = %config.kube_secret,
        "Loaded configuration"
    );

    let state = Arc::new(WebhookState::new(config.sidecar_config()));
    start_server(config.server_config(), state).await?;

    Ok(())
}
