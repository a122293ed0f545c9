//! LabInstance Custom Resource Definition
//!
//! A LabInstance is one running copy of a LabTemplate. The controller owns
//! every object it creates for the instance and reports aggregate readiness
//! back onto its status.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::LabPhase;

/// Specification for a LabInstance
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "labweaver.dev",
    version = "v1alpha1",
    kind = "LabInstance",
    plural = "labinstances",
    shortname = "li",
    status = "LabInstanceStatus",
    namespaced,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Pods","type":"string","jsonPath":".status.numPodsRunning"}"#,
    printcolumn = r#"{"name":"VMs","type":"string","jsonPath":".status.numVMsRunning"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LabInstanceSpec {
    /// Name of the LabTemplate (same namespace) this instance runs
    pub lab_template_reference: String,
}

/// Observed state of a LabInstance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabInstanceStatus {
    /// Overall readiness label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LabPhase>,

    /// Running container workloads as `running/total`
    #[serde(default)]
    pub num_pods_running: String,

    /// Ready virtual machines as `ready/total`
    #[serde(default, rename = "numVMsRunning")]
    pub num_vms_running: String,
}

impl LabInstanceStatus {
    /// Create a new status with the given phase
    pub fn with_phase(phase: LabPhase) -> Self {
        Self {
            status: Some(phase),
            ..Default::default()
        }
    }

    /// Set the container fraction and return self for chaining
    pub fn pods(mut self, fraction: impl Into<String>) -> Self {
        self.num_pods_running = fraction.into();
        self
    }

    /// Set the virtual machine fraction and return self for chaining
    pub fn vms(mut self, fraction: impl Into<String>) -> Self {
        self.num_vms_running = fraction.into();
        self
    }
}

impl LabInstance {
    /// Instance name, empty when the metadata carries none
    pub fn name_str(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Instance namespace, empty when the metadata carries none
    pub fn namespace_str(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Check that the instance carries the identity every entry point needs
    ///
    /// Produced objects are named after and owned by the instance, so a
    /// missing name, namespace or uid is a caller fault.
    pub fn validate_identity(&self) -> Result<(), crate::Error> {
        if self.name_str().is_empty() {
            return Err(crate::Error::bad_request("LabInstance has no name"));
        }
        if self.namespace_str().is_empty() {
            return Err(crate::Error::bad_request(format!(
                "LabInstance '{}' has no namespace",
                self.name_str()
            )));
        }
        if self.metadata.uid.as_deref().unwrap_or_default().is_empty() {
            return Err(crate::Error::bad_request(format!(
                "LabInstance '{}' has no uid",
                self.name_str()
            )));
        }
        if self.spec.lab_template_reference.is_empty() {
            return Err(crate::Error::bad_request(format!(
                "LabInstance '{}' references no LabTemplate",
                self.name_str()
            )));
        }
        Ok(())
    }
}
