//! Sidecar workload types and patch generation
//!
//! This module defines the container spec injected into opted-in pods and
//! the JSON patch that appends it:
//! - [`SidecarConfig`]: process-wide settings, fixed at startup
//! - [`SidecarSpec`]: the Tailscale container, built fresh per admission
//! - [`build_patch`]: a single `add` to `/spec/containers/-`
//!
//! The types serialize to the same JSON as the Kubernetes core/v1 Container
//! fields they mirror, so the patch value can be applied as-is.

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, Patch, PatchOperation};
use serde::{Deserialize, Serialize};

use crate::naming::{hostname, interpolate_and_sanitize_secret_name, sidecar_container_name};
use crate::pod::PodView;

/// Default Tailscale image
pub const DEFAULT_IMAGE: &str = "ghcr.io/tailscale/tailscale:latest";

/// Default name of the Secret holding `TS_AUTHKEY`
pub const DEFAULT_AUTH_SECRET: &str = "tailscale-auth";

/// Key of the auth key inside the auth Secret
pub const AUTH_KEY_SECRET_KEY: &str = "TS_AUTHKEY";

/// Pull policy of the sidecar image
pub const IMAGE_PULL_POLICY: &str = "Always";

// =============================================================================
// Configuration
// =============================================================================

/// Settings shared by every injected sidecar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidecarConfig {
    /// Sidecar image reference
    pub image: String,
    /// Passed through verbatim as `TS_EXTRA_ARGS`
    pub extra_args: String,
    /// State secret name pattern; empty means the default pattern
    pub secret_pattern: String,
    /// Secret holding the optional `TS_AUTHKEY`
    pub auth_secret: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            extra_args: String::new(),
            secret_pattern: String::new(),
            auth_secret: DEFAULT_AUTH_SECRET.to_string(),
        }
    }
}

// =============================================================================
// Container types
// =============================================================================

/// The injected Tailscale container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SidecarSpec {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Image pull policy
    pub image_pull_policy: String,
    /// Environment variables, in injection order
    pub env: Vec<EnvVar>,
    /// Security context
    pub security_context: SecurityContext,
}

impl SidecarSpec {
    /// Look up an environment variable by name
    pub fn env_var(&self, name: &str) -> Option<&EnvVar> {
        self.env.iter().find(|e| e.name == name)
    }
}

/// Environment variable, either a literal or a reference resolved by the kubelet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Reference to a value resolved at pod start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    /// Variable with a literal value
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// Variable read from a Secret key that may not exist
    pub fn optional_secret_key(
        name: impl Into<String>,
        secret: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.into(),
                    key: key.into(),
                    optional: Some(true),
                }),
                field_ref: None,
            }),
        }
    }

    /// Variable read from one of the pod's own fields
    pub fn field(name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: None,
                field_ref: Some(ObjectFieldSelector {
                    field_path: field_path.into(),
                }),
            }),
        }
    }
}

/// Source of a referenced environment value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    /// Secret key reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeySelector>,
    /// Pod field reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<ObjectFieldSelector>,
}

/// Selects a key of a Secret in the pod's namespace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key within the Secret
    pub key: String,
    /// Whether the pod may start without the Secret or key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Selects a field of the pod
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFieldSelector {
    /// Field path, e.g. `metadata.name`
    pub field_path: String,
}

/// Container security context
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    /// Run the container privileged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
}

// =============================================================================
// Builders
// =============================================================================

/// Build the sidecar container for a pod.
///
/// The sidecar runs in kernel networking mode, so it is always privileged.
pub fn build_sidecar(pod: &PodView, config: &SidecarConfig) -> SidecarSpec {
    let kube_secret = interpolate_and_sanitize_secret_name(
        &config.secret_pattern,
        &pod.namespace,
        &pod.name,
        &pod.uid,
    );

    SidecarSpec {
        name: sidecar_container_name(&pod.namespace, &pod.name),
        image: config.image.clone(),
        image_pull_policy: IMAGE_PULL_POLICY.to_string(),
        env: vec![
            EnvVar::literal("TS_EXTRA_ARGS", config.extra_args.as_str()),
            EnvVar::literal("TS_HOSTNAME", hostname(&pod.name, &pod.namespace)),
            EnvVar::literal("TS_KUBE_SECRET", kube_secret),
            EnvVar::literal("TS_USERSPACE", "false"),
            EnvVar::literal("TS_DEBUG_FIREWALL_MODE", "auto"),
            EnvVar::optional_secret_key(
                "TS_AUTHKEY",
                config.auth_secret.as_str(),
                AUTH_KEY_SECRET_KEY,
            ),
            EnvVar::field("POD_NAME", "metadata.name"),
            EnvVar::field("POD_UID", "metadata.uid"),
        ],
        security_context: SecurityContext {
            privileged: Some(true),
        },
    }
}

/// Pointer that appends to the pod's container list
pub fn containers_append_path() -> PointerBuf {
    PointerBuf::from_tokens(["spec", "containers", "-"])
}

/// Build the JSON patch that appends the sidecar to the pod
pub fn build_patch(pod: &PodView, config: &SidecarConfig) -> Patch {
    let sidecar = build_sidecar(pod, config);

    Patch(vec![PatchOperation::Add(AddOperation {
        path: containers_append_path(),
        // Strings, bools and vectors only: serialization cannot fail
        value: serde_json::to_value(&sidecar).unwrap_or_default(),
    })])
}
