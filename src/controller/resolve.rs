//! Template resolution: the read-only inputs of a convergence pass

use tracing::debug;

use super::client::LabClient;
use crate::crd::{LabInstance, LabTemplate, NodeType, NodeTypeRef};
use crate::{Error, Result};

/// Load and validate the LabTemplate an instance references
///
/// A missing template is `Error::NotFound`; a template that fails validation
/// is a BadRequest since no amount of waiting fixes it.
pub async fn resolve_template(client: &dyn LabClient, instance: &LabInstance) -> Result<LabTemplate> {
    let namespace = instance.namespace_str();
    let name = &instance.spec.lab_template_reference;
    if namespace.is_empty() || name.is_empty() {
        return Err(Error::bad_request(
            "LabInstance needs a namespace and a template reference",
        ));
    }

    let template = client
        .get_lab_template(namespace, name)
        .await?
        .ok_or_else(|| Error::not_found("LabTemplate", name))?;

    template
        .spec
        .validate()
        .map_err(|e| Error::bad_request(format!("LabTemplate '{}': {}", name, e)))?;

    debug!(template = %name, nodes = template.spec.nodes.len(), "resolved LabTemplate");
    Ok(template)
}

/// Load the NodeType a node references
pub async fn resolve_node_type(
    client: &dyn LabClient,
    namespace: &str,
    node_type_ref: &NodeTypeRef,
) -> Result<NodeType> {
    if node_type_ref.type_.is_empty() {
        return Err(Error::bad_request("node references no NodeType"));
    }

    client
        .get_node_type(namespace, &node_type_ref.type_)
        .await?
        .ok_or_else(|| Error::not_found("NodeType", &node_type_ref.type_))
}
