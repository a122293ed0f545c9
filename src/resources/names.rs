//! Deterministic names of everything the controller creates
//!
//! Every produced object is looked up by name before it is created, so these
//! functions are the single source of truth for idempotent convergence.

use sha2::{Digest, Sha256};

/// Shared network attachment: `<instance>-network`
pub fn network(instance: &str) -> String {
    format!("{}-network", instance)
}

/// Terminal service account: `<instance>-ttyd-svcacc`
pub fn service_account(instance: &str) -> String {
    format!("{}-ttyd-svcacc", instance)
}

/// Terminal role: `<instance>-ttyd-role`
pub fn role(instance: &str) -> String {
    format!("{}-ttyd-role", instance)
}

/// Terminal role binding: `<instance>-ttyd-rolebind`
pub fn role_binding(instance: &str) -> String {
    format!("{}-ttyd-rolebind", instance)
}

/// Terminal pod: `<instance>-ttyd-pod`
pub fn terminal_pod(instance: &str) -> String {
    format!("{}-ttyd-pod", instance)
}

/// Terminal service: `<instance>-ttyd-service`
///
/// Also the `app` label value selecting the terminal pod.
pub fn terminal_service(instance: &str) -> String {
    format!("{}-ttyd-service", instance)
}

/// Node workload (pod or virtual machine): `<instance>-<node>`
pub fn workload(instance: &str, node: &str) -> String {
    format!("{}-{}", instance, node)
}

/// Remote-access service: `<instance>-<node>-remote-access`
///
/// Also the `app` label value every node workload carries.
pub fn remote_access(instance: &str, node: &str) -> String {
    format!("{}-{}-remote-access", instance, node)
}

/// Per-node ingress: `<instance>-<node>-ingress`
pub fn ingress(instance: &str, node: &str) -> String {
    format!("{}-{}-ingress", instance, node)
}

/// Linux bridge device backing the instance network
///
/// Interface names are limited to 15 bytes, so the name is `br-` plus the
/// first 12 hex chars of SHA-256 over `<namespace>/<instance>`.
pub fn bridge(namespace: &str, instance: &str) -> String {
    let digest = Sha256::digest(format!("{}/{}", namespace, instance).as_bytes());
    let hex: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
    format!("br-{}", hex)
}
