//! Mutating Admission Webhook for Tailscale sidecars
//!
//! This module provides the HTTP surface of the injector:
//! - `POST /mutate` - Pod AdmissionReview in, AdmissionReview with an
//!   optional JSON patch out
//! - `GET /health` - Liveness probe, always `OK`
//!
//! Any other method on these paths is answered with 405. The shared state is
//! immutable after startup, so handlers never lock.

pub mod codec;
pub mod pod_mutation;

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};

use crate::error::Error;
use crate::workload::SidecarConfig;

use self::codec::ReviewCodec;

/// Shared state for webhook handlers
#[derive(Clone, Debug)]
pub struct WebhookState {
    /// Settings applied to every injected sidecar
    pub sidecar: SidecarConfig,
    /// Admission review codec
    pub codec: ReviewCodec,
}

impl WebhookState {
    /// Create a new webhook state for the given sidecar settings
    pub fn new(sidecar: SidecarConfig) -> Self {
        Self {
            sidecar,
            codec: ReviewCodec::for_pods(),
        }
    }
}

/// Create the webhook router with the mutation and liveness endpoints
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(
            "/mutate",
            post(pod_mutation::mutate_handler).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler).fallback(method_not_allowed))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed(method.to_string())
}
