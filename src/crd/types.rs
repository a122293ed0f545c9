//! Supporting types shared by the Labweaver CRDs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference from a node definition to its NodeType catalog entry
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct NodeTypeRef {
    /// Name of the NodeType in the instance's namespace
    #[serde(rename = "type")]
    pub type_: String,

    /// Image repository the node runs (e.g. "ubuntu")
    #[serde(default)]
    pub image: String,

    /// Image tag (e.g. "22.04")
    #[serde(default)]
    pub version: String,
}

impl NodeTypeRef {
    /// Image reference in `image:version` form, or just `image` without a version
    pub fn image_reference(&self) -> String {
        if self.version.is_empty() {
            self.image.clone()
        } else {
            format!("{}:{}", self.image, self.version)
        }
    }
}

/// Transport protocol of an exposed port
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortProtocol {
    /// TCP (default)
    #[default]
    Tcp,
    /// UDP
    Udp,
    /// SCTP
    Sctp,
}

impl std::fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Sctp => write!(f, "SCTP"),
        }
    }
}

/// A named port a node exposes for remote access
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Port {
    /// Port name (becomes the Service port name)
    pub name: String,

    /// Transport protocol
    #[serde(default)]
    pub protocol: PortProtocol,

    /// Port number
    pub port: i32,
}

/// Which workload shape a node renders into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadKind {
    /// Plain container pod
    Pod,
    /// KubeVirt virtual machine
    Vm,
}

impl WorkloadKind {
    /// Map a NodeType kind string to a workload shape
    ///
    /// Only the exact value `vm` selects a virtual machine; every other value,
    /// including an empty one, falls back to a pod.
    pub fn from_node_type_kind(kind: &str) -> Self {
        if kind == "vm" {
            Self::Vm
        } else {
            Self::Pod
        }
    }

    /// Short label handed to the web terminal
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Vm => "vm",
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall readiness label of a lab instance
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum LabPhase {
    /// At least one container workload is not running yet
    Pending,
    /// Every container runs and every virtual machine is ready
    Running,
    /// Containers run but at least one virtual machine is not ready
    #[serde(rename = "Not Ready")]
    NotReady,
}

impl std::fmt::Display for LabPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::NotReady => write!(f, "Not Ready"),
        }
    }
}
