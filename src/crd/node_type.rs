//! NodeType Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::WorkloadKind;

/// Catalog entry describing how to run one kind of lab node
///
/// `node_spec` is a template body rendered per node into either a pod spec
/// or a KubeVirt virtual machine spec, depending on `kind`.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "labweaver.dev",
    version = "v1alpha1",
    kind = "NodeType",
    plural = "nodetypes",
    shortname = "nt",
    namespaced,
    printcolumn = r#"{"name":"Kind","type":"string","jsonPath":".spec.kind"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeSpec {
    /// `vm` for a virtual machine, anything else for a container pod
    #[serde(default)]
    pub kind: String,

    /// Template body for the workload spec
    #[serde(default)]
    pub node_spec: String,
}

impl NodeTypeSpec {
    /// Workload shape selected by `kind`
    pub fn workload_kind(&self) -> WorkloadKind {
        WorkloadKind::from_node_type_kind(&self.kind)
    }
}
