//! Per-node exposure: a LoadBalancer for declared ports and a terminal ingress
//!
//! Both are only created for nodes that declare ports.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{ApiResource, DynamicObject};

use super::{app_labels, names, owned_meta, BuildRequest, DependencyKind, ResourceBuilder};
use crate::crd::to_dynamic;
use crate::{Error, Result, TERMINAL_PORT};

/// Annotation the nginx ingress controller reads to rewrite the path
pub const REWRITE_TARGET_ANNOTATION: &str = "nginx.ingress.kubernetes.io/rewrite-target";

/// Builds `<instance>-<node>-remote-access`
#[derive(Debug, Default)]
pub struct RemoteAccessServiceBuilder;

impl ResourceBuilder for RemoteAccessServiceBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::RemoteAccessService
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Service>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let node = req.node(self.kind())?.node;
        if node.ports.is_empty() {
            return Err(Error::bad_request(format!(
                "node '{}' declares no ports to expose",
                node.name
            )));
        }

        let name = names::remote_access(req.instance_name(), &node.name);
        let ports = node
            .ports
            .iter()
            .map(|p| ServicePort {
                name: Some(p.name.clone()),
                protocol: Some(p.protocol.to_string()),
                port: p.port,
                target_port: Some(IntOrString::Int(p.port)),
                ..Default::default()
            })
            .collect();

        let service = Service {
            metadata: owned_meta(req.instance, name.clone())?,
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                selector: Some(app_labels(name)),
                ports: Some(ports),
                ..Default::default()
            }),
            status: None,
        };
        to_dynamic(&service)
    }
}

/// Builds `<instance>-<node>-ingress`
///
/// Routes `/<namespace>/<instance>/<node>` to the shared terminal service and
/// rewrites the request so ttyd receives the workload kind and name as
/// command arguments for `konnect`.
#[derive(Debug, Default)]
pub struct RemoteAccessIngressBuilder;

impl ResourceBuilder for RemoteAccessIngressBuilder {
    fn kind(&self) -> DependencyKind {
        DependencyKind::RemoteAccessIngress
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource::erase::<Ingress>(&())
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject> {
        let resolved = req.node(self.kind())?;
        let node = resolved.node;
        let instance = req.instance_name();
        let namespace = req.instance.namespace_str();
        let workload = names::workload(instance, &node.name);

        let mut metadata = owned_meta(req.instance, names::ingress(instance, &node.name))?;
        metadata.annotations = Some(BTreeMap::from([(
            REWRITE_TARGET_ANNOTATION.to_string(),
            format!("/?arg={}&arg={}", resolved.workload_kind(), workload),
        )]));

        let path = HTTPIngressPath {
            path: Some(format!("/{}/{}/{}", namespace, instance, node.name)),
            path_type: "Prefix".to_string(),
            backend: IngressBackend {
                service: Some(IngressServiceBackend {
                    name: names::terminal_service(instance),
                    port: Some(ServiceBackendPort {
                        number: Some(TERMINAL_PORT),
                        name: None,
                    }),
                }),
                resource: None,
            },
        };

        let ingress = Ingress {
            metadata,
            spec: Some(IngressSpec {
                ingress_class_name: Some(req.settings.ingress_class.clone()),
                rules: Some(vec![IngressRule {
                    host: req.settings.ingress_host.clone(),
                    http: Some(HTTPIngressRuleValue { paths: vec![path] }),
                }]),
                ..Default::default()
            }),
            status: None,
        };
        to_dynamic(&ingress)
    }
}
