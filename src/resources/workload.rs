//! Node workloads, rendered from their NodeType templates

use k8s_openapi::api::core::v1::Pod;
use kube::api::{ApiResource, DynamicObject};

use super::{BuildRequest, DependencyKind, ResourceBuilder};
use crate::crd::{to_dynamic, HasApiResource, VirtualMachine};
use crate::Result;

/// Builds `<instance>-<node>` as a container pod
#[derive(Debug, Default)]
pub struct NodePodBuilder;

impl ResourceBuilder for NodePodBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::NodePod
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Pod>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let node = req.node(self.kind())?;
        let pod = req.renderer.render_pod(req.instance, node)?;
        to_dynamic(&pod)
    }
}

/// Builds `<instance>-<node>` as a KubeVirt virtual machine
#[derive(Debug, Default)]
pub struct NodeVmBuilder;

impl ResourceBuilder for NodeVmBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::NodeVm
    }

    fn api_resource(&self) -> ApiResource {
        VirtualMachine::api_resource()
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let node = req.node(self.kind())?;
        let vm = req.renderer.render_vm(req.instance, node)?;
        to_dynamic(&vm)
    }
}
