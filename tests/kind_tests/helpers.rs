//! Shared setup for cluster integration tests

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::{Client, CustomResourceExt};

use labweaver::crd::{LabInstance, LabTemplate, NodeType};
use labweaver::FIELD_MANAGER;

/// Connect to the test cluster and make sure every CRD the tests touch exists
pub async fn ensure_test_cluster() -> Result<Client, String> {
    let client = Client::try_default()
        .await
        .map_err(|e| format!("failed to connect to cluster: {}", e))?;

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for crd in [LabInstance::crd(), LabTemplate::crd(), NodeType::crd(), multus_crd()?] {
        let name = crd.metadata.name.clone().unwrap_or_default();
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| format!("failed to install CRD {}: {}", name, e))?;
    }

    // new CRDs take a moment to be served
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    Ok(client)
}

/// Minimal NetworkAttachmentDefinition CRD for clusters without Multus
fn multus_crd() -> Result<CustomResourceDefinition, String> {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": { "name": "network-attachment-definitions.k8s.cni.cncf.io" },
        "spec": {
            "group": "k8s.cni.cncf.io",
            "scope": "Namespaced",
            "names": {
                "plural": "network-attachment-definitions",
                "singular": "network-attachment-definition",
                "kind": "NetworkAttachmentDefinition",
                "shortNames": ["net-attach-def"]
            },
            "versions": [{
                "name": "v1",
                "served": true,
                "storage": true,
                "schema": {
                    "openAPIV3Schema": {
                        "type": "object",
                        "x-kubernetes-preserve-unknown-fields": true
                    }
                }
            }]
        }
    }))
    .map_err(|e| format!("invalid multus CRD: {}", e))
}

/// Create a fresh namespace, deleting any leftover from a previous run
pub async fn fresh_namespace(client: &Client, name: &str) -> Result<(), String> {
    delete_namespace(client, name).await;

    let api: Api<Namespace> = Api::all(client.clone());
    for _ in 0..60 {
        if api.get_opt(name).await.map_err(|e| e.to_string())?.is_none() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    let ns: Namespace = serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": name }
    }))
    .map_err(|e| e.to_string())?;
    api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(&ns))
        .await
        .map_err(|e| format!("failed to create namespace {}: {}", name, e))?;
    Ok(())
}

/// Delete a namespace and everything in it, ignoring errors
pub async fn delete_namespace(client: &Client, name: &str) {
    let api: Api<Namespace> = Api::all(client.clone());
    let _ = api.delete(name, &DeleteParams::default()).await;
}
