//! ts-injector - mutating admission webhook that adds a Tailscale sidecar to Pods
//!
//! The API server sends every Pod CREATE to `POST /mutate`. Pods labeled
//! `tailscale.com/inject: "true"` get a privileged Tailscale container
//! appended through a JSON patch; everything else is allowed unchanged.
//! The webhook never denies a pod and keeps no state between requests.
//!
//! # Architecture
//!
//! ```text
//! AdmissionReview ──► codec ──► policy ──► naming + workload ──► codec ──► AdmissionReview
//!                    (decode)  (skip or    (names, sidecar,     (encode)
//!                               inject)     JSON patch)
//! ```
//!
//! # Modules
//!
//! - [`naming`] - Sanitized sidecar, hostname and secret names
//! - [`pod`] - Read-only view of the admitted pod
//! - [`policy`] - Injection decision (opt-in label, idempotence)
//! - [`workload`] - Sidecar container spec and JSON patch
//! - [`webhook`] - AdmissionReview codec and HTTP handlers
//! - [`server`] - TLS listener and graceful shutdown
//! - [`config`] - Flags and environment configuration
//! - [`error`] - Error types for the webhook

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod naming;
pub mod pod;
pub mod policy;
pub mod server;
pub mod webhook;
pub mod workload;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default port for the webhook HTTPS server
///
/// Port 8443 is used instead of 443 to avoid requiring root privileges.
pub const DEFAULT_PORT: u16 = 8443;
