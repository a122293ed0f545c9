//! Template context for node spec rendering
//!
//! Values available to a node template:
//! - `{{ instance.name }}`, `{{ instance.namespace }}`, `{{ instance.network }}`
//! - `{{ node.name }}`, `{{ node.type }}`, `{{ node.image }}`, `{{ node.version }}`
//! - `{{ node.imageRef }}` - `image:version`, or just `image` without a version
//! - `{{ node.config }}` - free-form config, empty string when unset
//! - `{{ node.ports }}` - list of `{ name, protocol, port }`

use minijinja::Value;
use serde::Serialize;

use crate::crd::NodeDefinition;

/// Template context containing all values available to a node template
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TemplateContext {
    /// Owning instance identity
    pub instance: InstanceContext,
    /// Node being rendered
    pub node: NodeContext,
}

/// `instance.*` values
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct InstanceContext {
    /// LabInstance name
    pub name: String,
    /// LabInstance namespace
    pub namespace: String,
    /// Name of the instance's shared network attachment
    pub network: String,
}

/// `node.*` values
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NodeContext {
    /// Node name
    pub name: String,
    /// NodeType name
    #[serde(rename = "type")]
    pub type_: String,
    /// Image repository
    pub image: String,
    /// Image tag
    pub version: String,
    /// `image:version`
    #[serde(rename = "imageRef")]
    pub image_ref: String,
    /// Free-form config
    pub config: String,
    /// Exposed ports
    pub ports: Vec<PortContext>,
}

/// `node.ports[*]` values
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PortContext {
    /// Port name
    pub name: String,
    /// Protocol (TCP, UDP, SCTP)
    pub protocol: String,
    /// Port number
    pub port: i32,
}

impl TemplateContext {
    /// Build the context for one node of an instance
    pub fn for_node(instance_name: &str, namespace: &str, node: &NodeDefinition) -> Self {
        Self {
            instance: InstanceContext {
                name: instance_name.to_string(),
                namespace: namespace.to_string(),
                network: crate::resources::names::network(instance_name),
            },
            node: NodeContext {
                name: node.name.clone(),
                type_: node.node_type_ref.type_.clone(),
                image: node.node_type_ref.image.clone(),
                version: node.node_type_ref.version.clone(),
                image_ref: node.node_type_ref.image_reference(),
                config: node.config.clone().unwrap_or_default(),
                ports: node
                    .ports
                    .iter()
                    .map(|p| PortContext {
                        name: p.name.clone(),
                        protocol: p.protocol.to_string(),
                        port: p.port,
                    })
                    .collect(),
            },
        }
    }

    /// Convert to minijinja Value for rendering
    pub fn to_value(&self) -> Value {
        Value::from_serialize(self)
    }
}
