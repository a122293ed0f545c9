//! Shared Multus network for an instance

use kube::api::{ApiResource, DynamicObject};

use super::{names, owned_meta, BuildRequest, DependencyKind, ResourceBuilder};
use crate::crd::{to_dynamic, HasApiResource, NetworkAttachmentDefinition};
use crate::Result;

/// CNI spec version written into the attachment config
const CNI_VERSION: &str = "0.3.1";

/// Builds `<instance>-network`, a layer-2 bridge every node pod attaches to
#[derive(Debug, Default)]
pub struct NetworkAttachmentBuilder;

impl ResourceBuilder for NetworkAttachmentBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::NetworkAttachment
    }

    fn api_resource(&self) -> ApiResource {
        NetworkAttachmentDefinition::api_resource()
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let instance = req.instance_name();
        let name = names::network(instance);
        let config = serde_json::json!({
            "cniVersion": CNI_VERSION,
            "name": name,
            "type": "bridge",
            "bridge": names::bridge(req.instance.namespace_str(), instance),
            "ipam": {},
        });

        let nad = NetworkAttachmentDefinition::new(
            owned_meta(req.instance, name)?,
            config.to_string(),
        );
        to_dynamic(&nad)
    }
}
