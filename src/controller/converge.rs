//! The ensure-exists primitive behind every convergence step
//!
//! `ensure` looks an object up by its deterministic name and creates it only
//! when absent. It never updates: once an object exists, later template edits
//! do not touch it.

use kube::api::DynamicObject;
use tracing::{debug, info};

use super::client::LabClient;
use crate::resources::{BuildRequest, BuilderRegistry, DependencyKind};
use crate::{Error, Result};

/// Outcome of ensuring one dependency
#[derive(Clone, Debug)]
pub enum Convergence {
    /// The object already existed; continue with the next step
    Present(DynamicObject),
    /// The object was just created; stop and requeue
    Created(DynamicObject),
}

impl Convergence {
    /// Whether the pass must stop here
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// The object, either found or created
    pub fn into_object(self) -> DynamicObject {
        match self {
            Self::Present(obj) | Self::Created(obj) => obj,
        }
    }
}

/// Ensure the object of `kind` exists for the request's instance (and node)
///
/// Unsupported kinds fail before any API call. A create that loses a race
/// with another writer re-reads the winner and reports it as present.
pub async fn ensure(
    client: &dyn LabClient,
    registry: &BuilderRegistry,
    kind: DependencyKind,
    req: &BuildRequest<'_>,
) -> Result<Convergence> {
    let builder = registry.get(kind)?;

    let namespace = req.instance.namespace_str();
    if req.instance_name().is_empty() || namespace.is_empty() {
        return Err(Error::bad_request(
            "LabInstance needs a name and namespace to own objects",
        ));
    }
    let node_name = req
        .node
        .as_ref()
        .filter(|_| kind.is_per_node())
        .map(|n| n.node.name.as_str());
    let name = kind.object_name(req.instance_name(), node_name)?;
    let resource = builder.api_resource();

    if let Some(existing) = client.get_object(&resource, namespace, &name).await? {
        debug!(%kind, %name, "already exists");
        return Ok(Convergence::Present(existing));
    }

    let desired = builder.build(req)?;
    match client.create_object(&resource, namespace, &desired).await {
        Ok(created) => {
            info!(%kind, %name, "created");
            Ok(Convergence::Created(created))
        }
        Err(Error::AlreadyExists { .. }) => {
            debug!(%kind, %name, "lost create race, re-reading");
            client
                .get_object(&resource, namespace, &name)
                .await?
                .map(Convergence::Present)
                .ok_or_else(|| Error::already_exists(kind.to_string(), name.clone()))
        }
        Err(e) => Err(e),
    }
}
