//! Web terminal plumbing shared by all nodes of an instance
//!
//! One ttyd pod per instance runs `konnect`, which execs into node pods or
//! attaches to VM consoles. It needs its own service account bound to a role
//! that allows exactly that, plus a ClusterIP service the per-node ingresses
//! route to.

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, Service, ServiceAccount, ServicePort, ServiceSpec,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{ApiResource, DynamicObject};

use super::{app_labels, names, owned_meta, BuildRequest, DependencyKind, ResourceBuilder};
use crate::crd::to_dynamic;
use crate::{Result, TERMINAL_PORT};

/// Named port of the terminal pod and service
const TERMINAL_PORT_NAME: &str = "ttyd";

fn rule(api_group: &str, resource: &str, verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![api_group.to_string()]),
        resources: Some(vec![resource.to_string()]),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// Builds `<instance>-ttyd-svcacc`
#[derive(Debug, Default)]
pub struct ServiceAccountBuilder;

impl ResourceBuilder for ServiceAccountBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::ServiceAccount
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<ServiceAccount>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let sa = ServiceAccount {
            metadata: owned_meta(req.instance, names::service_account(req.instance_name()))?,
            ..Default::default()
        };
        to_dynamic(&sa)
    }
}

/// Builds `<instance>-ttyd-role`
#[derive(Debug, Default)]
pub struct TerminalRoleBuilder;

impl ResourceBuilder for TerminalRoleBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Role
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Role>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let role = Role {
            metadata: owned_meta(req.instance, names::role(req.instance_name()))?,
            rules: Some(vec![
                rule("", "pods", &["get", "list"]),
                rule("", "pods/exec", &["create"]),
                rule("kubevirt.io", "virtualmachineinstances", &["get", "list"]),
                rule(
                    "subresources.kubevirt.io",
                    "virtualmachineinstances/console",
                    &["get"],
                ),
            ]),
        };
        to_dynamic(&role)
    }
}

/// Builds `<instance>-ttyd-rolebind`
#[derive(Debug, Default)]
pub struct RoleBindingBuilder;

impl ResourceBuilder for RoleBindingBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::RoleBinding
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<RoleBinding>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let instance = req.instance_name();
        let binding = RoleBinding {
            metadata: owned_meta(req.instance, names::role_binding(instance))?,
            role_ref: RoleRef {
                api_group: "rbac.authorization.k8s.io".to_string(),
                kind: "Role".to_string(),
                name: names::role(instance),
            },
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".to_string(),
                name: names::service_account(instance),
                namespace: Some(req.instance.namespace_str().to_string()),
                api_group: None,
            }]),
        };
        to_dynamic(&binding)
    }
}

/// Builds `<instance>-ttyd-pod`
#[derive(Debug, Default)]
pub struct TerminalPodBuilder;

impl ResourceBuilder for TerminalPodBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::TerminalPod
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Pod>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let instance = req.instance_name();
        let mut metadata = owned_meta(req.instance, names::terminal_pod(instance))?;
        metadata.labels = Some(app_labels(names::terminal_service(instance)));

        let pod = Pod {
            metadata,
            spec: Some(PodSpec {
                service_account_name: Some(names::service_account(instance)),
                containers: vec![Container {
                    name: format!("{}-ttyd-container", instance),
                    image: Some(req.settings.terminal_image.clone()),
                    args: Some(vec![
                        "ttyd".to_string(),
                        "-a".to_string(),
                        "konnect".to_string(),
                    ]),
                    ports: Some(vec![ContainerPort {
                        name: Some(TERMINAL_PORT_NAME.to_string()),
                        container_port: TERMINAL_PORT,
                        protocol: Some("TCP".to_string()),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: None,
        };
        to_dynamic(&pod)
    }
}

/// Builds `<instance>-ttyd-service`
#[derive(Debug, Default)]
pub struct TerminalServiceBuilder;

impl ResourceBuilder for TerminalServiceBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::TerminalService
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Service>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let name = names::terminal_service(req.instance_name());
        let service = Service {
            metadata: owned_meta(req.instance, name.clone())?,
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                selector: Some(app_labels(name)),
                ports: Some(vec![ServicePort {
                    name: Some(TERMINAL_PORT_NAME.to_string()),
                    port: TERMINAL_PORT,
                    target_port: Some(IntOrString::Int(TERMINAL_PORT)),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            status: None,
        };
        to_dynamic(&service)
    }
}
