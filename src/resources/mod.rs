//! Builders for every object a LabInstance owns
//!
//! Each dependent kind has one [`ResourceBuilder`] that knows where the
//! object lives in the API ([`ResourceBuilder::api_resource`]) and how to
//! construct the desired object for an instance and, for per-node kinds, a
//! resolved node. The [`BuilderRegistry`] is the dispatch table the
//! convergence primitive uses: a kind without a registered builder is
//! unsupported and never reaches the API server.

pub mod names;

mod exposure;
mod network;
mod terminal;
mod workload;

use std::collections::BTreeMap;
use std::sync::Arc;

use kube::api::{ApiResource, DynamicObject, ObjectMeta};
use kube::Resource;

use crate::crd::LabInstance;
use crate::render::{ManifestRenderer, ResolvedNode};
use crate::{Error, Result, DEFAULT_INGRESS_CLASS, DEFAULT_TERMINAL_IMAGE};

pub use exposure::{RemoteAccessIngressBuilder, RemoteAccessServiceBuilder};
pub use network::NetworkAttachmentBuilder;
pub use terminal::{
    RoleBindingBuilder, ServiceAccountBuilder, TerminalPodBuilder, TerminalRoleBuilder,
    TerminalServiceBuilder,
};
pub use workload::{NodePodBuilder, NodeVmBuilder};

/// Every kind of object the controller creates for a LabInstance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
    /// Multus network shared by all nodes
    NetworkAttachment,
    /// Service account the web terminal runs as
    ServiceAccount,
    /// Role granting the terminal exec/console access
    Role,
    /// Binding of the terminal role to its service account
    RoleBinding,
    /// Web terminal pod
    TerminalPod,
    /// ClusterIP service in front of the terminal pod
    TerminalService,
    /// Container workload of a node
    NodePod,
    /// Virtual machine workload of a node
    NodeVm,
    /// LoadBalancer service exposing a node's ports
    RemoteAccessService,
    /// Ingress routing a node's terminal path
    RemoteAccessIngress,
}

impl DependencyKind {
    /// All kinds in registration order
    pub const ALL: [DependencyKind; 10] = [
        Self::NetworkAttachment,
        Self::ServiceAccount,
        Self::Role,
        Self::RoleBinding,
        Self::TerminalPod,
        Self::TerminalService,
        Self::NodePod,
        Self::NodeVm,
        Self::RemoteAccessService,
        Self::RemoteAccessIngress,
    ];

    /// Kinds created once per instance, in convergence order
    pub const SHARED: [DependencyKind; 6] = [
        Self::NetworkAttachment,
        Self::ServiceAccount,
        Self::Role,
        Self::RoleBinding,
        Self::TerminalPod,
        Self::TerminalService,
    ];

    /// Whether one object of this kind exists per node
    pub fn is_per_node(&self) -> bool {
        matches!(
            self,
            Self::NodePod | Self::NodeVm | Self::RemoteAccessService | Self::RemoteAccessIngress
        )
    }

    /// Name of the object this kind produces
    ///
    /// Per-node kinds need the node name; asking without one is a BadRequest.
    pub fn object_name(&self, instance: &str, node: Option<&str>) -> Result<String> {
        let per_node = |f: fn(&str, &str) -> String| match node {
            Some(node) if !node.is_empty() => Ok(f(instance, node)),
            _ => Err(Error::bad_request(format!("{} requires a node", self))),
        };
        match self {
            Self::NetworkAttachment => Ok(names::network(instance)),
            Self::ServiceAccount => Ok(names::service_account(instance)),
            Self::Role => Ok(names::role(instance)),
            Self::RoleBinding => Ok(names::role_binding(instance)),
            Self::TerminalPod => Ok(names::terminal_pod(instance)),
            Self::TerminalService => Ok(names::terminal_service(instance)),
            Self::NodePod | Self::NodeVm => per_node(names::workload),
            Self::RemoteAccessService => per_node(names::remote_access),
            Self::RemoteAccessIngress => per_node(names::ingress),
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NetworkAttachment => "NetworkAttachmentDefinition",
            Self::ServiceAccount => "ServiceAccount",
            Self::Role => "Role",
            Self::RoleBinding => "RoleBinding",
            Self::TerminalPod => "Pod (terminal)",
            Self::TerminalService => "Service (terminal)",
            Self::NodePod => "Pod",
            Self::NodeVm => "VirtualMachine",
            Self::RemoteAccessService => "Service (remote access)",
            Self::RemoteAccessIngress => "Ingress",
        };
        f.write_str(s)
    }
}

/// Deployment-specific knobs the builders read
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildSettings {
    /// Image of the web terminal pod
    pub terminal_image: String,
    /// Ingress class for per-node ingresses
    pub ingress_class: String,
    /// Host the per-node ingresses answer on (any host when unset)
    pub ingress_host: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            terminal_image: DEFAULT_TERMINAL_IMAGE.to_string(),
            ingress_class: DEFAULT_INGRESS_CLASS.to_string(),
            ingress_host: None,
        }
    }
}

/// Everything a builder may read when constructing an object
#[derive(Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Owning instance
    pub instance: &'a LabInstance,
    /// Node for per-node kinds
    pub node: Option<ResolvedNode<'a>>,
    /// Deployment knobs
    pub settings: &'a BuildSettings,
    /// Renderer for node workloads
    pub renderer: &'a ManifestRenderer,
}

impl<'a> BuildRequest<'a> {
    /// Create a request for a shared (per-instance) object
    pub fn shared(
        instance: &'a LabInstance,
        settings: &'a BuildSettings,
        renderer: &'a ManifestRenderer,
    ) -> Self {
        Self {
            instance,
            node: None,
            settings,
            renderer,
        }
    }

    /// Create a request for a per-node object
    pub fn for_node(self, node: ResolvedNode<'a>) -> Self {
        Self {
            node: Some(node),
            ..self
        }
    }

    /// Instance name
    pub fn instance_name(&self) -> &'a str {
        self.instance.name_str()
    }

    /// Resolved node, or BadRequest for a per-node kind requested without one
    pub fn node(&self, kind: DependencyKind) -> Result<&ResolvedNode<'a>> {
        self.node
            .as_ref()
            .ok_or_else(|| Error::bad_request(format!("{} requires a node", kind)))
    }
}

/// Builds the desired object for one dependency kind
pub trait ResourceBuilder: Send + Sync {
    /// Dependency kind this builder serves
    fn kind(&self) -> DependencyKind;

    /// API coordinates of the produced object
    fn api_resource(&self) -> ApiResource;

    /// Construct the desired object, owner reference included
    fn build(&self, req: &BuildRequest<'_>) -> Result<DynamicObject>;
}

/// Dispatch table from dependency kind to builder
#[derive(Clone)]
pub struct BuilderRegistry {
    builders: BTreeMap<DependencyKind, Arc<dyn ResourceBuilder>>,
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("kinds", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BuilderRegistry {
    /// Create a registry with every built-in builder
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(NetworkAttachmentBuilder));
        registry.register(Arc::new(ServiceAccountBuilder));
        registry.register(Arc::new(TerminalRoleBuilder));
        registry.register(Arc::new(RoleBindingBuilder));
        registry.register(Arc::new(TerminalPodBuilder));
        registry.register(Arc::new(TerminalServiceBuilder));
        registry.register(Arc::new(NodePodBuilder));
        registry.register(Arc::new(NodeVmBuilder));
        registry.register(Arc::new(RemoteAccessServiceBuilder));
        registry.register(Arc::new(RemoteAccessIngressBuilder));
        registry
    }

    /// Create a registry with no builders
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Register a builder, replacing any previous one for its kind
    pub fn register(&mut self, builder: Arc<dyn ResourceBuilder>) {
        self.builders.insert(builder.kind(), builder);
    }

    /// Drop the builder for a kind, making it unsupported
    pub fn without(mut self, kind: DependencyKind) -> Self {
        self.builders.remove(&kind);
        self
    }

    /// Builder for a kind, or `Error::Unsupported`
    pub fn get(&self, kind: DependencyKind) -> Result<&Arc<dyn ResourceBuilder>> {
        self.builders
            .get(&kind)
            .ok_or_else(|| Error::unsupported(kind.to_string()))
    }

    /// Whether a builder is registered for the kind
    pub fn supports(&self, kind: DependencyKind) -> bool {
        self.builders.contains_key(&kind)
    }
}

/// Metadata for an object owned by the instance
///
/// Sets name, the instance's namespace, and a controller owner reference.
/// Owner references need the instance uid, so an instance read from the
/// API server is required.
pub fn owned_meta(instance: &LabInstance, name: impl Into<String>) -> Result<ObjectMeta> {
    let owner = instance.controller_owner_ref(&()).ok_or_else(|| {
        Error::bad_request(format!(
            "LabInstance '{}' has no uid to own objects with",
            instance.name_str()
        ))
    })?;

    Ok(ObjectMeta {
        name: Some(name.into()),
        namespace: Some(instance.namespace_str().to_string()),
        owner_references: Some(vec![owner]),
        ..Default::default()
    })
}

/// Labels map with a single `app` entry
pub(crate) fn app_labels(value: impl Into<String>) -> BTreeMap<String, String> {
    BTreeMap::from([(crate::APP_LABEL.to_string(), value.into())])
}
