//! Process configuration
//!
//! Every setting can be given as a flag or through the environment variable
//! the webhook Deployment sets. An empty variable counts as unset, so
//! manifests that template `value: ""` still get the defaults. Configuration
//! is read once at startup and never reloaded.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use crate::server::ServerConfig;
use crate::workload::{SidecarConfig, DEFAULT_AUTH_SECRET, DEFAULT_IMAGE};
use crate::DEFAULT_PORT;

/// Default TLS certificate path (mounted from the webhook's serving Secret)
pub const DEFAULT_TLS_CERT: &str = "/etc/webhook/certs/tls.crt";

/// Default TLS private key path
pub const DEFAULT_TLS_KEY: &str = "/etc/webhook/certs/tls.key";

/// Default drain time after a shutdown signal
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Tailscale sidecar injector - mutating admission webhook for Pods
#[derive(Parser, Debug, Clone)]
#[command(name = "ts-injector", version, about, long_about = None)]
pub struct Config {
    /// Port to serve HTTPS on
    #[arg(
        long,
        env = "PORT",
        default_value_t = DEFAULT_PORT,
        value_parser = or_default(DEFAULT_PORT)
    )]
    pub port: u16,

    /// Path to the TLS certificate (PEM)
    #[arg(
        long,
        env = "TLS_CERT",
        default_value = DEFAULT_TLS_CERT,
        value_parser = or_default(PathBuf::from(DEFAULT_TLS_CERT))
    )]
    pub tls_cert: PathBuf,

    /// Path to the TLS private key (PEM)
    #[arg(
        long,
        env = "TLS_KEY",
        default_value = DEFAULT_TLS_KEY,
        value_parser = or_default(PathBuf::from(DEFAULT_TLS_KEY))
    )]
    pub tls_key: PathBuf,

    /// Extra arguments passed to the sidecar as TS_EXTRA_ARGS
    #[arg(
        long,
        env = "TS_EXTRA_ARGS",
        default_value_t,
        allow_hyphen_values = true
    )]
    pub extra_args: String,

    /// State secret name pattern
    ///
    /// Supports {{NAMESPACE}}, {{POD_NAME}} and {{POD_UID}}. Defaults to
    /// tailscale-{{NAMESPACE}}-{{POD_NAME}} when empty.
    #[arg(long, env = "TS_KUBE_SECRET", default_value_t)]
    pub kube_secret: String,

    /// Tailscale image for the sidecar
    #[arg(
        long,
        env = "TS_IMAGE",
        default_value = DEFAULT_IMAGE,
        value_parser = or_default(DEFAULT_IMAGE.to_string())
    )]
    pub image: String,

    /// Secret holding the optional TS_AUTHKEY
    #[arg(
        long,
        env = "TS_AUTH_SECRET",
        default_value = DEFAULT_AUTH_SECRET,
        value_parser = or_default(DEFAULT_AUTH_SECRET.to_string())
    )]
    pub auth_secret: String,

    /// Seconds to let in-flight requests finish after SIGTERM
    #[arg(
        long,
        env = "SHUTDOWN_GRACE_SECS",
        default_value_t = DEFAULT_SHUTDOWN_GRACE_SECS,
        value_parser = or_default(DEFAULT_SHUTDOWN_GRACE_SECS)
    )]
    pub shutdown_grace_secs: u64,
}

impl Config {
    /// Settings applied to every injected sidecar
    pub fn sidecar_config(&self) -> SidecarConfig {
        SidecarConfig {
            image: self.image.clone(),
            extra_args: self.extra_args.clone(),
            secret_pattern: self.kube_secret.clone(),
            auth_secret: self.auth_secret.clone(),
        }
    }

    /// Listener settings, binding on all interfaces
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::from(([0, 0, 0, 0], self.port)),
            cert_path: self.tls_cert.clone(),
            key_path: self.tls_key.clone(),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }
}

/// Value parser that maps an empty value to `default`
fn or_default<T>(default: T) -> impl Fn(&str) -> Result<T, String> + Clone + Send + Sync + 'static
where
    T: FromStr + Clone + Send + Sync + 'static,
    T::Err: Display,
{
    move |raw: &str| {
        if raw.is_empty() {
            return Ok(default.clone());
        }
        raw.parse::<T>().map_err(|e| e.to_string())
    }
}
