//! HTTPS server for the webhook
//!
//! The API server only calls admission webhooks over TLS. The certificate
//! and key are read once at startup from the paths in [`ServerConfig`];
//! rotation is handled outside the process by restarting it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::info;

use crate::error::Error;
use crate::webhook::{webhook_router, WebhookState};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// TLS certificate PEM path
    pub cert_path: PathBuf,
    /// TLS private key PEM path
    pub key_path: PathBuf,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace: Duration,
}

/// Load the TLS material and serve the webhook until a shutdown signal
pub async fn start_server(config: ServerConfig, state: Arc<WebhookState>) -> Result<(), Error> {
    let tls_config = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(|e| {
            Error::transport(format!(
                "failed to load TLS material from {} and {}: {}",
                config.cert_path.display(),
                config.key_path.display(),
                e
            ))
        })?;

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), config.shutdown_grace));

    info!(addr = %config.addr, "Starting webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .handle(handle)
        .serve(webhook_router(state).into_make_service())
        .await
        .map_err(|e| Error::transport(format!("server error on {}: {}", config.addr, e)))?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle, grace: Duration) {
    shutdown_signal().await;
    info!(
        grace_secs = grace.as_secs(),
        "Shutdown signal received, draining connections"
    );
    handle.graceful_shutdown(Some(grace));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
