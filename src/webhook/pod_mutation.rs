//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pods, appending a Tailscale sidecar
//! to pods that opt in with the `tailscale.com/inject` label.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::naming::sidecar_container_name;
use crate::pod::PodView;
use crate::policy::{evaluate, Decision};
use crate::workload::{build_patch, SidecarConfig};

use super::codec::AdmissionDecision;
use super::WebhookState;

/// Handle mutating admission review for Pods
///
/// This handler:
/// 1. Decodes the AdmissionReview and the embedded Pod
/// 2. Evaluates the injection policy
/// 3. Builds the sidecar patch if the pod opted in
/// 4. Returns the encoded AdmissionReview response
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, Error> {
    let body = body.map_err(|e| {
        warn!(error = %e, "Failed to read admission request body");
        Error::request(e.to_string())
    })?;

    let encoded = admit(&state, &body)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], encoded).into_response())
}

/// Run one review body through decode, policy, patch and encode
pub fn admit(state: &WebhookState, body: &[u8]) -> Result<Vec<u8>, Error> {
    let review = state.codec.decode(body).inspect_err(|e| {
        warn!(error = %e, "Failed to decode admission review");
    })?;

    let decision = decide(&review.pod, &review.request.uid, &state.sidecar);

    state
        .codec
        .encode(&review.request, &decision)
        .inspect_err(|e| {
            warn!(
                uid = %review.request.uid,
                error = %e,
                "Failed to encode admission response"
            );
        })
}

/// Decide what to do with a single pod
pub fn decide(pod: &PodView, uid: &str, config: &SidecarConfig) -> AdmissionDecision {
    match evaluate(pod) {
        Decision::Skip(reason) => {
            debug!(
                uid = %uid,
                namespace = %pod.namespace,
                pod = %pod.name,
                reason = %reason,
                "Skipping sidecar injection"
            );
            AdmissionDecision::skip(uid, &reason)
        }
        Decision::Inject => {
            info!(
                uid = %uid,
                namespace = %pod.namespace,
                pod = %pod.name,
                container = %sidecar_container_name(&pod.namespace, &pod.name),
                "Injecting Tailscale sidecar"
            );
            AdmissionDecision::inject(uid, build_patch(pod, config))
        }
    }
}
