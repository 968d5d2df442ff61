//! AdmissionReview decoding and encoding
//!
//! [`ReviewCodec`] is built once at startup and shared read-only by every
//! request. It knows the single resource kind the webhook accepts (core/v1
//! Pod), turns a raw review body into a [`PodView`], and wraps an
//! [`AdmissionDecision`] back into a response envelope. The response never
//! echoes the request or the pod.

use base64::{engine::general_purpose::STANDARD, Engine};
use json_patch::Patch;
use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::GroupVersionKind;
use serde_json::Value;

use crate::error::Error;
use crate::pod::PodView;
use crate::policy::SkipReason;

/// Message reported when a sidecar was added
pub const INJECTED_MESSAGE: &str = "Sidecar injected successfully";

/// Final answer for one admission request
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionDecision {
    /// Uid of the request being answered
    pub uid: String,
    /// Whether the pod may be created (always true: this webhook never denies)
    pub allowed: bool,
    /// Patch to apply; present only when injecting
    pub patch: Option<Patch>,
    /// Human-readable outcome
    pub message: String,
}

impl AdmissionDecision {
    /// Allow the pod unchanged
    pub fn skip(uid: impl Into<String>, reason: &SkipReason) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            patch: None,
            message: reason.message().to_string(),
        }
    }

    /// Allow the pod with the sidecar patch applied
    pub fn inject(uid: impl Into<String>, patch: Patch) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            patch: Some(patch),
            message: INJECTED_MESSAGE.to_string(),
        }
    }
}

/// A decoded admission request together with the pod it carries
#[derive(Debug)]
pub struct DecodedReview {
    /// The admission request (uid, kind, namespace, object)
    pub request: AdmissionRequest<Pod>,
    /// View of the embedded pod
    pub pod: PodView,
}

/// Decoder/encoder for pod admission reviews
#[derive(Clone, Debug)]
pub struct ReviewCodec {
    kind: GroupVersionKind,
}

impl ReviewCodec {
    /// Codec accepting core/v1 Pods
    pub fn for_pods() -> Self {
        Self {
            kind: GroupVersionKind::gvk("", "v1", "Pod"),
        }
    }

    /// Decode a raw AdmissionReview body
    pub fn decode(&self, body: &[u8]) -> Result<DecodedReview, Error> {
        let review: AdmissionReview<Pod> = serde_json::from_slice(body)
            .map_err(|e| Error::decode(e.to_string()))?;
        let request: AdmissionRequest<Pod> = review
            .try_into()
            .map_err(|e: kube::core::admission::ConvertAdmissionReviewError| Error::decode(e.to_string()))?;

        if request.kind != self.kind {
            return Err(Error::decode(format!(
                "unsupported resource kind {}/{}/{}",
                request.kind.group, request.kind.version, request.kind.kind
            )));
        }

        let pod = request
            .object
            .as_ref()
            .ok_or_else(|| Error::decode("request carries no pod object"))?;
        let pod = PodView::from_pod(pod, request.namespace.as_deref());

        Ok(DecodedReview { request, pod })
    }

    /// Encode a decision as the AdmissionReview response for `request`
    pub fn encode(
        &self,
        request: &AdmissionRequest<Pod>,
        decision: &AdmissionDecision,
    ) -> Result<Vec<u8>, Error> {
        let mut response = AdmissionResponse::from(request);
        response.uid = decision.uid.clone();
        response.allowed = decision.allowed;
        response.result.message = decision.message.clone();

        if let Some(patch) = &decision.patch {
            response = response
                .with_patch(patch.clone())
                .map_err(|e| Error::encode(e.to_string()))?;
        }

        // kube serializes the patch bytes as a number array; the API server
        // expects a base64 string
        let patch = response.patch.take().map(|bytes| STANDARD.encode(bytes));
        let mut review = serde_json::to_value(response.into_review())
            .map_err(|e| Error::encode(e.to_string()))?;

        if let Some(patch) = patch {
            review
                .get_mut("response")
                .and_then(Value::as_object_mut)
                .ok_or_else(|| Error::encode("review carries no response"))?
                .insert("patch".to_string(), Value::String(patch));
        }

        serde_json::to_vec(&review)
            .map_err(|e| Error::encode(e.to_string()))
    }
}
