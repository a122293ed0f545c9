//! Third-party kinds the controller creates but does not define
//!
//! KubeVirt `VirtualMachine` and Multus `NetworkAttachmentDefinition` are
//! installed by their own operators. They are modelled as plain serde types
//! and sent through `DynamicObject`, so the controller neither ships their
//! schemas nor needs them installed to print its own CRDs.

use kube::api::{ApiResource, DynamicObject, ObjectMeta};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::Error;

/// Trait for types with a compile-time known API group, version, and kind
pub trait HasApiResource {
    /// Full API version (e.g., "kubevirt.io/v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "VirtualMachine")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from a known apiVersion and kind
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    };
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Plurals that simple suffix rules get wrong
const KIND_PLURALS: &[(&str, &str)] = &[
    // Multus
    (
        "networkattachmentdefinition",
        "network-attachment-definitions",
    ),
    // KubeVirt
    ("virtualmachine", "virtualmachines"),
    ("virtualmachineinstance", "virtualmachineinstances"),
];

fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    if let Some((_, plural)) = KIND_PLURALS.iter().find(|(singular, _)| *singular == lower) {
        return (*plural).to_string();
    }

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}

/// Convert a typed object into a `DynamicObject`
///
/// The value must serialize with `apiVersion` and `kind` set.
pub fn to_dynamic<T: Serialize>(obj: &T) -> Result<DynamicObject, Error> {
    let value = serde_json::to_value(obj).map_err(|e| Error::serialization(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| Error::serialization(e.to_string()))
}

/// Decode a `DynamicObject` read from the API server into a typed object
pub fn from_dynamic<T: DeserializeOwned>(obj: &DynamicObject) -> Result<T, Error> {
    let value = serde_json::to_value(obj).map_err(|e| Error::serialization(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| Error::serialization(e.to_string()))
}

// =============================================================================
// KubeVirt
// =============================================================================

/// KubeVirt VirtualMachine
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Always `kubevirt.io/v1`
    pub api_version: String,
    /// Always `VirtualMachine`
    pub kind: String,
    /// Object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state
    pub spec: VirtualMachineSpec,
    /// Observed state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VirtualMachineStatus>,
}

impl HasApiResource for VirtualMachine {
    const API_VERSION: &'static str = "kubevirt.io/v1";
    const KIND: &'static str = "VirtualMachine";
}

impl VirtualMachine {
    /// Create a VirtualMachine with type metadata filled in
    pub fn new(metadata: ObjectMeta, spec: VirtualMachineSpec) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            metadata,
            spec,
            status: None,
        }
    }

    /// Whether KubeVirt reports the machine ready
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    /// KubeVirt's human-readable state, `Unknown` before it reports one
    pub fn printable_status(&self) -> &str {
        self.status
            .as_ref()
            .and_then(|s| s.printable_status.as_deref())
            .unwrap_or("Unknown")
    }

    /// Whether KubeVirt gave up starting the machine
    pub fn has_start_failure(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.start_failure.is_some())
    }
}

/// Desired state of a KubeVirt VirtualMachine
///
/// Only the fields the controller touches are typed. The instance spec is
/// kept as a JSON object and passed through untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    /// Legacy on/off switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    /// Run strategy (Always, RerunOnFailure, Manual, Halted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_strategy: Option<String>,

    /// Template for the VirtualMachineInstance
    pub template: VirtualMachineInstanceTemplate,

    /// DataVolumes created alongside the machine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_volume_templates: Vec<serde_json::Value>,
}

/// VirtualMachineInstance template
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VirtualMachineInstanceTemplate {
    /// Metadata copied onto the instance and its virt-launcher pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,

    /// VirtualMachineInstance spec (domain, volumes, networks)
    pub spec: serde_json::Map<String, serde_json::Value>,
}

/// Observed state of a KubeVirt VirtualMachine
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    /// Whether the machine's instance is running and ready
    #[serde(default)]
    pub ready: bool,

    /// Human-readable state (Starting, Running, CrashLoopBackOff, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printable_status: Option<String>,

    /// Set when KubeVirt backs off after repeated start failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_failure: Option<serde_json::Value>,
}

// =============================================================================
// Multus
// =============================================================================

/// Multus NetworkAttachmentDefinition
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachmentDefinition {
    /// Always `k8s.cni.cncf.io/v1`
    pub api_version: String,
    /// Always `NetworkAttachmentDefinition`
    pub kind: String,
    /// Object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// CNI configuration
    pub spec: NetworkAttachmentDefinitionSpec,
}

impl HasApiResource for NetworkAttachmentDefinition {
    const API_VERSION: &'static str = "k8s.cni.cncf.io/v1";
    const KIND: &'static str = "NetworkAttachmentDefinition";
}

impl NetworkAttachmentDefinition {
    /// Create a NetworkAttachmentDefinition with type metadata filled in
    pub fn new(metadata: ObjectMeta, config: String) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            metadata,
            spec: NetworkAttachmentDefinitionSpec { config },
        }
    }
}

/// Spec of a NetworkAttachmentDefinition
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NetworkAttachmentDefinitionSpec {
    /// CNI JSON document
    pub config: String,
}
