//! Manifest rendering for lab nodes
//!
//! A node's template body (its own `nodeSpec`, else its NodeType's) is
//! rendered with the instance and node values in scope and decoded straight
//! into the workload schema. Decoding happens before anything else touches
//! the result, so a broken template fails with a single `Error::Render` and
//! nothing is created.
//!
//! The renderer then stamps identity onto the workload:
//! - name `<instance>-<node>` in the instance's namespace
//! - label `app: <instance>-<node>-remote-access` for exposure selectors
//! - a controller owner reference to the LabInstance
//! - pods only: the Multus networks annotation naming `<instance>-network`

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Pod, PodSpec};
use kube::api::ObjectMeta;

use crate::crd::{
    LabInstance, NodeDefinition, NodeTypeSpec, VirtualMachine, VirtualMachineSpec, WorkloadKind,
};
use crate::resources::{app_labels, names, owned_meta};
use crate::template::{TemplateContext, TemplateEngine, TemplateError};
use crate::{Error, Result, NETWORKS_ANNOTATION};

/// A node definition paired with its resolved NodeType
#[derive(Clone, Copy, Debug)]
pub struct ResolvedNode<'a> {
    /// Node as declared in the LabTemplate
    pub node: &'a NodeDefinition,
    /// NodeType the node references
    pub node_type: &'a NodeTypeSpec,
}

impl<'a> ResolvedNode<'a> {
    /// Pair a node with its NodeType
    pub fn new(node: &'a NodeDefinition, node_type: &'a NodeTypeSpec) -> Self {
        Self { node, node_type }
    }

    /// Workload shape chosen by the NodeType kind
    pub fn workload_kind(&self) -> WorkloadKind {
        self.node_type.workload_kind()
    }

    /// Template body to render: the node override, else the NodeType's
    pub fn body(&self) -> std::result::Result<&'a str, TemplateError> {
        match self.node.node_spec.as_deref() {
            Some(body) if !body.trim().is_empty() => Ok(body),
            _ if !self.node_type.node_spec.trim().is_empty() => Ok(self.node_type.node_spec.as_str()),
            _ => Err(TemplateError::missing_body(&self.node.name)),
        }
    }
}

/// Renders resolved nodes into Pod and VirtualMachine manifests
#[derive(Debug, Default)]
pub struct ManifestRenderer {
    engine: TemplateEngine,
}

impl ManifestRenderer {
    /// Create a renderer with a fresh template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a node into a container pod
    pub fn render_pod(&self, instance: &LabInstance, node: &ResolvedNode<'_>) -> Result<Pod> {
        let rendered = self.render_body(instance, node)?;
        let spec: PodSpec = serde_yaml::from_str(&rendered)
            .map_err(|e| Error::render(format!("node '{}' pod spec: {}", node.node.name, e)))?;

        if spec.containers.is_empty() {
            return Err(Error::render(format!(
                "node '{}' pod spec declares no containers",
                node.node.name
            )));
        }
        if let Some(c) = spec.containers.iter().find(|c| c.name.is_empty()) {
            return Err(Error::render(format!(
                "node '{}' pod spec has a container without a name (image {:?})",
                node.node.name, c.image
            )));
        }

        let mut metadata = self.workload_meta(instance, node.node)?;
        metadata.annotations = Some(BTreeMap::from([(
            NETWORKS_ANNOTATION.to_string(),
            names::network(instance.name_str()),
        )]));

        Ok(Pod {
            metadata,
            spec: Some(spec),
            status: None,
        })
    }

    /// Render a node into a KubeVirt virtual machine
    ///
    /// A spec that sets neither `running` nor `runStrategy` is started.
    pub fn render_vm(
        &self,
        instance: &LabInstance,
        node: &ResolvedNode<'_>,
    ) -> Result<VirtualMachine> {
        let rendered = self.render_body(instance, node)?;
        let mut spec: VirtualMachineSpec = serde_yaml::from_str(&rendered)
            .map_err(|e| Error::render(format!("node '{}' vm spec: {}", node.node.name, e)))?;

        if spec.running.is_none() && spec.run_strategy.is_none() {
            spec.running = Some(true);
        }

        let metadata = self.workload_meta(instance, node.node)?;

        // virt-launcher pods inherit the template labels, which is what the
        // remote-access service selects on
        let template_meta = spec.template.metadata.get_or_insert_with(ObjectMeta::default);
        template_meta
            .labels
            .get_or_insert_with(BTreeMap::new)
            .extend(metadata.labels.clone().unwrap_or_default());

        Ok(VirtualMachine::new(metadata, spec))
    }

    fn render_body(&self, instance: &LabInstance, node: &ResolvedNode<'_>) -> Result<String> {
        check_identity(instance, node.node)?;
        let body = node.body()?;
        let ctx = TemplateContext::for_node(instance.name_str(), instance.namespace_str(), node.node);
        Ok(self.engine.render(body, &ctx)?)
    }

    fn workload_meta(&self, instance: &LabInstance, node: &NodeDefinition) -> Result<ObjectMeta> {
        let instance_name = instance.name_str();
        let mut metadata = owned_meta(instance, names::workload(instance_name, &node.name))?;
        metadata.labels = Some(app_labels(names::remote_access(instance_name, &node.name)));
        Ok(metadata)
    }
}

fn check_identity(instance: &LabInstance, node: &NodeDefinition) -> Result<()> {
    if instance.name_str().is_empty() || instance.namespace_str().is_empty() {
        return Err(Error::bad_request(
            "cannot render a node for a LabInstance without name and namespace",
        ));
    }
    if node.name.is_empty() {
        return Err(Error::bad_request(format!(
            "cannot render an unnamed node for LabInstance '{}'",
            instance.name_str()
        )));
    }
    Ok(())
}
