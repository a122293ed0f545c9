//! LabTemplate Custom Resource Definition
//!
//! A LabTemplate is the reusable topology: an ordered list of nodes, each
//! typed by a NodeType from the catalog. The controller only reads templates.

use std::collections::HashSet;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{NodeTypeRef, Port};

/// Specification for a LabTemplate
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "labweaver.dev",
    version = "v1alpha1",
    kind = "LabTemplate",
    plural = "labtemplates",
    shortname = "lt",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LabTemplateSpec {
    /// Nodes of the topology, in creation order
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

/// One node of a lab topology
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    /// Node name, unique within the template
    pub name: String,

    /// NodeType this node is rendered from, plus its image coordinates
    pub node_type_ref: NodeTypeRef,

    /// Ports exposed for remote access
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,

    /// Template body overriding the NodeType's for this node only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_spec: Option<String>,

    /// Free-form configuration (usually cloud-init user data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl NodeDefinition {
    /// Whether this node gets a remote-access Service and Ingress
    pub fn is_exposed(&self) -> bool {
        !self.ports.is_empty()
    }
}

impl LabTemplateSpec {
    /// Validate the topology
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.nodes.is_empty() {
            return Err(crate::Error::validation("template must declare at least one node"));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(crate::Error::validation("node name cannot be empty"));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(crate::Error::validation(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
            if node.node_type_ref.type_.is_empty() {
                return Err(crate::Error::validation(format!(
                    "node '{}' has no nodeTypeRef.type",
                    node.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeDefinition {
        NodeDefinition {
            name: name.to_string(),
            node_type_ref: NodeTypeRef {
                type_: "ubuntu".to_string(),
                image: "ubuntu".to_string(),
                version: "22.04".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn valid_template_passes() {
        let spec = LabTemplateSpec {
            nodes: vec![node("r1"), node("r2")],
        };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn empty_template_is_rejected() {
        let err = LabTemplateSpec::default().validate().unwrap_err();
        assert!(err.to_string().contains("at least one node"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let spec = LabTemplateSpec {
            nodes: vec![node("r1"), node("r1")],
        };
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate node name 'r1'"));
    }

    #[test]
    fn unnamed_node_is_rejected() {
        let spec = LabTemplateSpec {
            nodes: vec![node("")],
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn untyped_node_is_rejected() {
        let mut n = node("r1");
        n.node_type_ref.type_.clear();
        let spec = LabTemplateSpec { nodes: vec![n] };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn parses_yaml_template() {
        let yaml = r#"
nodes:
  - name: sw1
    nodeTypeRef:
      type: ubuntu-pod
      image: ubuntu
      version: "22.04"
    ports:
      - name: ssh
        port: 22
  - name: r1
    nodeTypeRef:
      type: cisco-vm
      image: cisco
      version: "1.0"
    config: |
      #cloud-config
      password: lab
"#;
        let spec: LabTemplateSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.nodes.len(), 2);
        assert!(spec.nodes[0].is_exposed());
        assert!(!spec.nodes[1].is_exposed());
        assert_eq!(spec.nodes[1].node_type_ref.type_, "cisco-vm");
        assert!(spec.nodes[1].config.as_deref().unwrap().contains("cloud-config"));
    }
}
