//! Read-only view of the pod under admission
//!
//! The webhook only cares about a handful of pod fields. [`PodView`] copies
//! those out of the decoded `k8s_openapi` Pod so the policy and the patch
//! builder never touch the full object, and nothing else from the pod can
//! leak into the response.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;

/// The fields of an admitted pod that drive sidecar injection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodView {
    /// Pod namespace
    pub namespace: String,
    /// Pod name
    pub name: String,
    /// Pod uid (usually empty on CREATE)
    pub uid: String,
    /// Pod labels
    pub labels: BTreeMap<String, String>,
    /// Names of the pod's existing containers, in spec order
    pub containers: Vec<String>,
}

impl PodView {
    /// Build a view from a decoded pod.
    ///
    /// Pods created by controllers often reach admission without
    /// `metadata.namespace`; `request_namespace` (from the admission request)
    /// fills the gap in that case.
    pub fn from_pod(pod: &Pod, request_namespace: Option<&str>) -> Self {
        let meta = &pod.metadata;

        let namespace = meta
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .or(request_namespace)
            .unwrap_or_default()
            .to_string();

        let containers = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();

        Self {
            namespace,
            name: meta.name.clone().unwrap_or_default(),
            uid: meta.uid.clone().unwrap_or_default(),
            labels: meta.labels.clone().unwrap_or_default(),
            containers,
        }
    }

    /// Look up a label, treating an absent label as empty
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Whether the pod already runs a container with this name
    pub fn has_container(&self, name: &str) -> bool {
        self.containers.iter().any(|c| c == name)
    }
}
