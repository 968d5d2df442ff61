//! Injection policy
//!
//! Decides whether a pod gets a Tailscale sidecar. Two rules, in order:
//!
//! 1. **Opt-in**: the pod must carry `tailscale.com/inject: "true"`.
//! 2. **Idempotence**: the pod must not already run the sidecar, under
//!    either its derived name or the fixed `ts-sidecar` name older releases
//!    injected.
//!
//! The API server may deliver the same admission request more than once, so
//! rule 2 is what keeps a pod from ending up with two sidecars.

use std::fmt;

use crate::naming::sidecar_container_name;
use crate::pod::PodView;

/// Label a pod must carry to get a sidecar
pub const INJECT_LABEL: &str = "tailscale.com/inject";

/// The only [`INJECT_LABEL`] value that opts a pod in
pub const INJECT_LABEL_VALUE: &str = "true";

/// Container name used before sidecar names were made unique per pod
pub const LEGACY_SIDECAR_NAME: &str = "ts-sidecar";

/// Why a pod was left unchanged
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The pod doesn't carry the opt-in label
    NotOptedIn,
    /// The pod already runs a sidecar
    AlreadyInjected {
        /// Name of the existing sidecar container
        container: String,
    },
}

impl SkipReason {
    /// Message reported back in the admission response
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::NotOptedIn => "Pod does not require sidecar injection",
            SkipReason::AlreadyInjected { .. } => "Sidecar already exists",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotOptedIn => write!(f, "not opted in"),
            SkipReason::AlreadyInjected { container } => {
                write!(f, "already injected ({container})")
            }
        }
    }
}

/// Outcome of evaluating the policy against a pod
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Leave the pod unchanged
    Skip(SkipReason),
    /// Append the sidecar
    Inject,
}

impl Decision {
    /// Whether this decision adds a sidecar
    pub fn is_inject(&self) -> bool {
        matches!(self, Decision::Inject)
    }
}

/// Evaluate the injection policy for a pod
pub fn evaluate(pod: &PodView) -> Decision {
    if pod.label(INJECT_LABEL) != INJECT_LABEL_VALUE {
        return Decision::Skip(SkipReason::NotOptedIn);
    }

    let sidecar = sidecar_container_name(&pod.namespace, &pod.name);
    for name in [sidecar.as_str(), LEGACY_SIDECAR_NAME] {
        if pod.has_container(name) {
            return Decision::Skip(SkipReason::AlreadyInjected {
                container: name.to_string(),
            });
        }
    }

    Decision::Inject
}
