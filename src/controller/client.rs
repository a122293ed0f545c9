//! Control-plane access for the LabInstance controller
//!
//! Everything the controller reads or writes goes through [`LabClient`], so
//! reconciliation can be driven against mocks or an in-memory fake in tests.

use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};

#[cfg(test)]
use mockall::automock;

use crate::crd::{LabInstance, LabInstanceStatus, LabTemplate, NodeType};
use crate::{Error, FIELD_MANAGER};

/// Trait abstracting Kubernetes operations for LabInstance reconciliation
///
/// Reads return `Ok(None)` when the object does not exist. A create that
/// loses a race with another writer fails with `Error::AlreadyExists`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LabClient: Send + Sync {
    /// Get a LabTemplate by namespace and name
    async fn get_lab_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabTemplate>, Error>;

    /// Get a NodeType by namespace and name
    async fn get_node_type(&self, namespace: &str, name: &str)
        -> Result<Option<NodeType>, Error>;

    /// Get any namespaced object by its API coordinates and name
    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, Error>;

    /// Create a namespaced object, returning what the server stored
    async fn create_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, Error>;

    /// Replace the status of a LabInstance
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &LabInstanceStatus,
    ) -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct KubeLabClient {
    client: Client,
}

impl KubeLabClient {
    /// Create a new KubeLabClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LabClient for KubeLabClient {
    async fn get_lab_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabTemplate>, Error> {
        let api: Api<LabTemplate> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_node_type(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<NodeType>, Error> {
        let api: Api<NodeType> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, Error> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, resource);
        Ok(api.get_opt(name).await?)
    }

    async fn create_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, resource);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match api.create(&params, object).await {
            Ok(created) => Ok(created),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                Err(Error::already_exists(&resource.kind, object.name_any()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &LabInstanceStatus,
    ) -> Result<(), Error> {
        let api: Api<LabInstance> = Api::namespaced(self.client.clone(), namespace);
        let status_patch = serde_json::json!({
            "status": status
        });

        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(&status_patch),
        )
        .await?;

        Ok(())
    }
}
