//! Property tests for name derivation and the injection decision.
//!
//! Namespaces and pod names reach the webhook unvalidated, so every derived
//! name must satisfy the DNS-1123 grammar for arbitrary input.

use std::collections::BTreeMap;

use proptest::prelude::*;
use ts_injector::naming::{
    hostname, interpolate_and_sanitize_secret_name, is_dns1123_label, is_dns1123_subdomain,
    sanitize, sidecar_container_name, MAX_LABEL_LEN, MAX_SUBDOMAIN_LEN,
};
use ts_injector::pod::PodView;
use ts_injector::policy::{evaluate, Decision, SkipReason, INJECT_LABEL};
use ts_injector::webhook::pod_mutation::decide;
use ts_injector::workload::{build_sidecar, SidecarConfig};

// Strategy: arbitrary strings, biased toward the characters sanitizers care about
fn arb_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        prop::string::string_regex("[-._A-Za-z0-9!{}]{0,80}").unwrap(),
        prop::string::string_regex("[-.]{0,10}").unwrap(),
    ]
}

// Strategy: secret-name patterns mixing placeholders and noise
fn arb_pattern() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("{{NAMESPACE}}".to_string()),
            Just("{{POD_NAME}}".to_string()),
            Just("{{POD_UID}}".to_string()),
            Just("{{UNKNOWN}}".to_string()),
            arb_raw(),
        ],
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

fn opted_in(namespace: &str, name: &str, containers: Vec<String>) -> PodView {
    PodView {
        namespace: namespace.to_string(),
        name: name.to_string(),
        uid: String::new(),
        labels: BTreeMap::from([(INJECT_LABEL.to_string(), "true".to_string())]),
        containers,
    }
}

proptest! {
    /// Property: sanitize is total, grammar-valid and idempotent
    #[test]
    fn proptest_sanitize_is_valid_and_idempotent(raw in arb_raw()) {
        let once = sanitize(&raw);

        prop_assert!(!once.is_empty());
        prop_assert!(once.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()));
        prop_assert!(once.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()));
        prop_assert!(once
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert_eq!(sanitize(&once), once);
    }

    /// Property: sidecar container names are always valid DNS-1123 labels
    #[test]
    fn proptest_sidecar_name_is_label(namespace in arb_raw(), name in arb_raw()) {
        let sidecar = sidecar_container_name(&namespace, &name);

        prop_assert!(sidecar.len() <= MAX_LABEL_LEN);
        prop_assert!(is_dns1123_label(&sidecar), "invalid name {:?}", sidecar);
    }

    /// Property: sidecar names are deterministic
    #[test]
    fn proptest_sidecar_name_is_deterministic(namespace in arb_raw(), name in arb_raw()) {
        prop_assert_eq!(
            sidecar_container_name(&namespace, &name),
            sidecar_container_name(&namespace, &name)
        );
    }

    /// Property: hostnames are always valid DNS-1123 labels
    #[test]
    fn proptest_hostname_is_label(namespace in arb_raw(), name in arb_raw()) {
        let host = hostname(&name, &namespace);
        prop_assert!(is_dns1123_label(&host), "invalid hostname {:?}", host);
    }

    /// Property: secret names are bounded and end alphanumeric
    #[test]
    fn proptest_secret_name_is_subdomain(
        pattern in arb_pattern(),
        namespace in arb_raw(),
        name in arb_raw(),
        uid in arb_raw(),
    ) {
        let secret = interpolate_and_sanitize_secret_name(&pattern, &namespace, &name, &uid);

        prop_assert!(secret.len() <= MAX_SUBDOMAIN_LEN);
        prop_assert!(secret.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()));
        prop_assert!(is_dns1123_subdomain(&secret), "invalid secret name {:?}", secret);
    }

    /// Property: an injected pod is never injected again
    #[test]
    fn proptest_injection_is_idempotent(
        namespace in arb_raw(),
        name in arb_raw(),
        existing in prop::collection::vec("[a-z]{1,8}", 0..4),
    ) {
        let config = SidecarConfig::default();
        let pod = opted_in(&namespace, &name, existing.clone());
        prop_assume!(evaluate(&pod) == Decision::Inject);

        let sidecar = build_sidecar(&pod, &config);
        let mut containers = existing;
        containers.push(sidecar.name.clone());
        let mutated = opted_in(&namespace, &name, containers);

        for _ in 0..2 {
            let decision = evaluate(&mutated);
            prop_assert!(
                matches!(decision, Decision::Skip(SkipReason::AlreadyInjected { .. })),
                "expected skip, got {:?}", decision
            );
        }
    }

    /// Property: a patch is present exactly when the pod is injected
    #[test]
    fn proptest_patch_iff_inject(
        label in prop::option::of(prop_oneof![Just("true".to_string()), arb_raw()]),
        namespace in arb_raw(),
        name in arb_raw(),
    ) {
        let mut pod = opted_in(&namespace, &name, vec!["app".to_string()]);
        pod.labels.clear();
        if let Some(value) = label {
            pod.labels.insert(INJECT_LABEL.to_string(), value);
        }

        let decision = decide(&pod, "uid", &SidecarConfig::default());

        prop_assert!(decision.allowed);
        prop_assert_eq!(decision.patch.is_some(), evaluate(&pod).is_inject());
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_unlabeled_pod_is_allowed_unchanged() {
    let pod = PodView {
        namespace: "default".to_string(),
        name: "my-pod".to_string(),
        containers: vec!["app".to_string()],
        ..Default::default()
    };

    let decision = decide(&pod, "uid-a", &SidecarConfig::default());
    assert!(decision.allowed);
    assert!(decision.patch.is_none());
}

#[test]
fn scenario_opted_in_pod_gets_named_sidecar() {
    let pod = opted_in("default", "my-pod", vec!["app".to_string()]);
    let sidecar = build_sidecar(&pod, &SidecarConfig::default());

    assert_eq!(evaluate(&pod), Decision::Inject);
    assert_eq!(sidecar.name, sidecar_container_name("default", "my-pod"));
    assert_eq!(
        sidecar
            .env_var("TS_HOSTNAME")
            .and_then(|e| e.value.as_deref()),
        Some(hostname("my-pod", "default").as_str())
    );
}

#[test]
fn scenario_existing_sidecar_is_skipped() {
    let pod = opted_in(
        "default",
        "my-pod",
        vec!["app".to_string(), sidecar_container_name("default", "my-pod")],
    );

    assert!(matches!(
        evaluate(&pod),
        Decision::Skip(SkipReason::AlreadyInjected { .. })
    ));
}

#[test]
fn scenario_adversarial_names_are_sanitized() {
    let sidecar = sidecar_container_name("My_NS", "Pod!1");
    assert_eq!(sidecar, "ts-sidecar-my-ns-pod-1");
}

#[test]
fn scenario_valid_secret_pattern_is_unchanged() {
    assert_eq!(
        interpolate_and_sanitize_secret_name(
            "tailscale-{{NAMESPACE}}-{{POD_NAME}}",
            "default",
            "my-pod",
            ""
        ),
        "tailscale-default-my-pod"
    );
}
