//! In-memory control plane for multi-pass reconciliation tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject};

use super::client::LabClient;
use crate::crd::{
    LabInstanceStatus, LabTemplate, LabTemplateSpec, NodeDefinition, NodeType, NodeTypeSpec,
};
use crate::Error;

/// A transient API server failure
pub(crate) fn server_error() -> Error {
    Error::Kube(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: "etcdserver: request timed out".to_string(),
        reason: "ServiceUnavailable".to_string(),
        code: 503,
    }))
}

type ObjectKey = (String, String, String);

#[derive(Default)]
struct State {
    templates: BTreeMap<(String, String), LabTemplate>,
    node_types: BTreeMap<(String, String), NodeType>,
    objects: BTreeMap<ObjectKey, DynamicObject>,
    created: Vec<String>,
    statuses: Vec<LabInstanceStatus>,
    lose_race_for: BTreeSet<String>,
    calls: usize,
}

/// Stores objects in memory keyed by kind, namespace and name
#[derive(Default)]
pub(crate) struct FakeLabClient {
    state: Mutex<State>,
}

fn key(resource: &ApiResource, namespace: &str, name: &str) -> ObjectKey {
    (
        format!("{}/{}", resource.api_version, resource.kind),
        namespace.to_string(),
        name.to_string(),
    )
}

impl FakeLabClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_template(self, namespace: &str, name: &str, nodes: Vec<NodeDefinition>) -> Self {
        let mut template = LabTemplate::new(name, LabTemplateSpec { nodes });
        template.metadata.namespace = Some(namespace.to_string());
        self.state
            .lock()
            .unwrap()
            .templates
            .insert((namespace.to_string(), name.to_string()), template);
        self
    }

    pub(crate) fn with_node_type(self, namespace: &str, name: &str, spec: NodeTypeSpec) -> Self {
        let mut node_type = NodeType::new(name, spec);
        node_type.metadata.namespace = Some(namespace.to_string());
        self.state
            .lock()
            .unwrap()
            .node_types
            .insert((namespace.to_string(), name.to_string()), node_type);
        self
    }

    /// Make the next create of `name` fail with AlreadyExists after another
    /// writer stored it
    pub(crate) fn lose_create_race_for(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .lose_race_for
            .insert(name.to_string());
        self
    }

    /// Objects created through this client, as `Kind/name`, in order
    pub(crate) fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub(crate) fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub(crate) fn statuses(&self) -> Vec<LabInstanceStatus> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn get(&self, kind: &str, namespace: &str, name: &str) -> Option<DynamicObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .find(|((k, ns, n), _)| k.ends_with(&format!("/{}", kind)) && ns == namespace && n == name)
            .map(|(_, obj)| obj.clone())
    }

    /// Set `status.phase` of a stored pod
    pub(crate) fn set_pod_phase(&self, namespace: &str, name: &str, phase: &str) {
        self.set_status(
            "Pod",
            namespace,
            name,
            serde_json::json!({ "phase": phase }),
        );
    }

    /// Set `status.ready` of a stored virtual machine
    pub(crate) fn set_vm_ready(&self, namespace: &str, name: &str, ready: bool) {
        self.set_status(
            "VirtualMachine",
            namespace,
            name,
            serde_json::json!({ "ready": ready }),
        );
    }

    fn set_status(&self, kind: &str, namespace: &str, name: &str, status: serde_json::Value) {
        let mut state = self.state.lock().unwrap();
        let obj = state
            .objects
            .iter_mut()
            .find(|((k, ns, n), _)| k.ends_with(&format!("/{}", kind)) && ns == namespace && n == name)
            .map(|(_, obj)| obj)
            .unwrap_or_else(|| panic!("no {kind} {namespace}/{name} stored"));
        obj.data["status"] = status;
    }
}

#[async_trait]
impl LabClient for FakeLabClient {
    async fn get_lab_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabTemplate>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state
            .templates
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn get_node_type(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<NodeType>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state
            .node_types
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.objects.get(&key(resource, namespace, name)).cloned())
    }

    async fn create_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let name = object.metadata.name.clone().unwrap_or_default();
        let k = key(resource, namespace, &name);
        if state.objects.contains_key(&k) {
            return Err(Error::already_exists(&resource.kind, name));
        }

        let mut stored = object.clone();
        stored.metadata.uid = Some(format!("uid-{}", state.objects.len()));
        state.objects.insert(k, stored.clone());

        if state.lose_race_for.remove(&name) {
            return Err(Error::already_exists(&resource.kind, name));
        }

        state.created.push(format!("{}/{}", resource.kind, name));
        Ok(stored)
    }

    async fn patch_status(
        &self,
        _namespace: &str,
        _name: &str,
        status: &LabInstanceStatus,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.statuses.push(status.clone());
        Ok(())
    }
}
