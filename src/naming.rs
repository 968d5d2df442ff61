//! Identifier derivation for injected sidecars
//!
//! Every name the webhook hands to Kubernetes or Tailscale is derived here:
//! - Sidecar container name: `ts-sidecar-<namespace>-<pod>`
//! - Tailscale hostname: `<pod>-<namespace>`
//! - State secret name: interpolated from a `TS_KUBE_SECRET` pattern
//!
//! All functions are total. Whatever the pod's namespace and name look like
//! (empty, uppercase, punctuation, non-ASCII), the output satisfies the
//! DNS-1123 grammar the API server enforces.
//!
//! Truncation happens before sanitization, so two pods whose
//! `<namespace>-<pod>` strings only differ past the suffix budget get the
//! same sidecar name. Hostnames and secret names are derived from the same
//! inputs, so changing this would rename existing tailnet nodes.

/// Prefix of every injected sidecar container name
pub const SIDECAR_NAME_PREFIX: &str = "ts-sidecar-";

/// Maximum length of a DNS-1123 label (container names, hostnames)
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a DNS-1123 subdomain (secret names)
pub const MAX_SUBDOMAIN_LEN: usize = 253;

/// Pattern used when no `TS_KUBE_SECRET` pattern is configured
pub const DEFAULT_SECRET_PATTERN: &str = "tailscale-{{NAMESPACE}}-{{POD_NAME}}";

/// Placeholder replaced by the pod's namespace
pub const NAMESPACE_PLACEHOLDER: &str = "{{NAMESPACE}}";

/// Placeholder replaced by the pod's name
pub const POD_NAME_PLACEHOLDER: &str = "{{POD_NAME}}";

/// Placeholder replaced by the pod's uid
pub const POD_UID_PLACEHOLDER: &str = "{{POD_UID}}";

/// Secret name used when sanitization leaves nothing behind
const FALLBACK_SECRET_NAME: &str = "tailscale-secret";

/// Character used to repair a name edge that isn't alphanumeric
const FILLER: char = 'x';

// =============================================================================
// Derived names
// =============================================================================

/// Derive the sidecar container name for a pod.
///
/// The `<namespace>-<name>` suffix is cut to whatever fits after
/// [`SIDECAR_NAME_PREFIX`] under [`MAX_LABEL_LEN`], then sanitized.
pub fn sidecar_container_name(namespace: &str, name: &str) -> String {
    let budget = MAX_LABEL_LEN - SIDECAR_NAME_PREFIX.len();
    let suffix = truncate_chars(&format!("{namespace}-{name}"), budget);
    format!("{SIDECAR_NAME_PREFIX}{}", sanitize(&suffix))
}

/// Derive the Tailscale hostname for a pod.
///
/// Pod names are only unique per namespace, so the namespace is appended to
/// keep nodes registered from different namespaces apart in the tailnet.
pub fn hostname(name: &str, namespace: &str) -> String {
    let joined = truncate_chars(&format!("{name}-{namespace}"), MAX_LABEL_LEN);
    sanitize(&joined)
}

/// Substitute the pod placeholders in a secret-name pattern.
///
/// An empty pattern falls back to [`DEFAULT_SECRET_PATTERN`]. Unknown
/// placeholders are left as they are.
pub fn interpolate_secret_pattern(
    pattern: &str,
    namespace: &str,
    pod_name: &str,
    pod_uid: &str,
) -> String {
    let pattern = if pattern.is_empty() {
        DEFAULT_SECRET_PATTERN
    } else {
        pattern
    };

    pattern
        .replace(NAMESPACE_PLACEHOLDER, namespace)
        .replace(POD_NAME_PLACEHOLDER, pod_name)
        .replace(POD_UID_PLACEHOLDER, pod_uid)
}

/// Interpolate a secret-name pattern and sanitize the result into a valid
/// Secret name.
pub fn interpolate_and_sanitize_secret_name(
    pattern: &str,
    namespace: &str,
    name: &str,
    uid: &str,
) -> String {
    sanitize_secret_name(&interpolate_secret_pattern(pattern, namespace, name, uid))
}

// =============================================================================
// Sanitizers
// =============================================================================

/// Sanitize a string into a DNS-1123 label body.
///
/// ASCII uppercase is folded to lowercase, anything outside `[a-z0-9-]`
/// becomes `-`, and leading/trailing hyphens are stripped. An empty result
/// becomes `x`. The output is never longer than the input's character count
/// (or 1), and sanitizing twice changes nothing.
pub fn sanitize(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if is_alphanumeric(c) || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = mapped.trim_matches('-');
    if trimmed.starts_with(is_alphanumeric) {
        trimmed.to_string()
    } else {
        format!("{FILLER}{trimmed}")
    }
}

/// Sanitize a string into a DNS-1123 subdomain usable as a Secret name.
///
/// Like [`sanitize`] but dots are kept, and every run of separators
/// collapses to its last separator (`--` → `-`, `..` → `.`, `-.` → `.`,
/// `.-` → `-`). Names longer than [`MAX_SUBDOMAIN_LEN`] are cut, and a
/// separator left at the cut is replaced with `x`.
pub fn sanitize_secret_name(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        let c = if is_alphanumeric(c) || is_separator(c) {
            c
        } else {
            '-'
        };
        if is_separator(c) && collapsed.ends_with(is_separator) {
            collapsed.pop();
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches(is_separator);
    if trimmed.is_empty() {
        return FALLBACK_SECRET_NAME.to_string();
    }

    let mut name = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with(is_alphanumeric) {
        name.push(FILLER);
    }
    name.push_str(trimmed);
    if !name.ends_with(is_alphanumeric) {
        name.push(FILLER);
    }

    if name.len() > MAX_SUBDOMAIN_LEN {
        // Only ASCII survives the mapping above, so byte offsets are char offsets.
        name.truncate(MAX_SUBDOMAIN_LEN);
        if name.ends_with(is_separator) {
            name.pop();
            name.push(FILLER);
        }
    }

    name
}

// =============================================================================
// Grammar checks
// =============================================================================

/// Check a string against the DNS-1123 label grammar:
/// `[a-z0-9]([-a-z0-9]*[a-z0-9])?`, at most 63 characters.
pub fn is_dns1123_label(s: &str) -> bool {
    s.len() <= MAX_LABEL_LEN && is_label_body(s)
}

/// Check a string against the DNS-1123 subdomain grammar: dot-separated
/// label bodies, at most 253 characters in total.
pub fn is_dns1123_subdomain(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_SUBDOMAIN_LEN && s.split('.').all(is_label_body)
}

fn is_label_body(s: &str) -> bool {
    s.starts_with(is_alphanumeric)
        && s.ends_with(is_alphanumeric)
        && s.chars().all(|c| is_alphanumeric(c) || c == '-')
}

fn is_alphanumeric(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '.'
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
