//! Labweaver - Kubernetes operator for lab topologies
//!
//! Labweaver converges a declared lab topology (a `LabInstance` referencing a
//! `LabTemplate` of nodes, each typed by a `NodeType`) into running container
//! pods and KubeVirt virtual machines, together with the plumbing needed to
//! reach them: a shared network attachment, a web terminal, and per-node
//! exposure objects.
//!
//! # Convergence model
//!
//! Every reconciliation walks a fixed dependency order and stops at the first
//! object it had to create, so a single pass never creates more than one
//! object. Once every dependency exists the controller folds the readiness of
//! all produced workloads into the `LabInstance` status.
//!
//! # Modules
//!
//! - [`crd`] - Custom Resource Definitions (LabInstance, LabTemplate, NodeType)
//!   and the external KubeVirt / Multus kinds the operator creates
//! - [`controller`] - Reconciliation loop, convergence primitive, status aggregation
//! - [`render`] - Renders node definitions into Pod and VirtualMachine manifests
//! - [`resources`] - Builders for every dependent object kind and their registry
//! - [`template`] - Template engine used to render node specs
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod controller;
pub mod crd;
pub mod error;
pub mod render;
pub mod resources;
pub mod template;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Field manager used for every write the controller makes
pub const FIELD_MANAGER: &str = "labweaver-controller";

/// Default image for the shared web terminal pod
pub const DEFAULT_TERMINAL_IMAGE: &str = "ghcr.io/insrapperswil/kube-ttyd:latest";

/// Port the web terminal listens on
pub const TERMINAL_PORT: i32 = 7681;

/// Default ingress class for per-node terminal ingresses
pub const DEFAULT_INGRESS_CLASS: &str = "nginx";

/// Label key used to wire exposure selectors to workloads
pub const APP_LABEL: &str = "app";

/// Annotation Multus reads to attach secondary networks to a pod
pub const NETWORKS_ANNOTATION: &str = "k8s.v1.cni.cncf.io/networks";
