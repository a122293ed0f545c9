//! Integration tests for CRD operations
//!
//! These tests tell the story of how lab authors publish templates and node
//! types, and how students request lab instances through the Kubernetes API.

use kube::api::{Api, PostParams};

use labweaver::crd::{
    LabInstance, LabInstanceSpec, LabTemplate, LabTemplateSpec, NodeDefinition, NodeType,
    NodeTypeRef, NodeTypeSpec, Port, PortProtocol, WorkloadKind,
};

use super::helpers::{delete_namespace, ensure_test_cluster, fresh_namespace};

const NS: &str = "labweaver-crd-test";

/// Story: A lab author publishes a two-node template
///
/// Expected behavior:
/// - The LabTemplate round-trips through the API server unchanged
/// - Node order, ports and type references are preserved
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_author_publishes_lab_template() {
    let client = ensure_test_cluster().await.expect("failed to setup cluster");
    fresh_namespace(&client, NS).await.expect("failed to create namespace");
    let api: Api<LabTemplate> = Api::namespaced(client.clone(), NS);

    let template = LabTemplate::new(
        "ccna",
        LabTemplateSpec {
            nodes: vec![
                NodeDefinition {
                    name: "sw1".to_string(),
                    node_type_ref: NodeTypeRef {
                        type_: "ubuntu-pod".to_string(),
                        image: "ubuntu".to_string(),
                        version: "22.04".to_string(),
                    },
                    ports: vec![Port {
                        name: "ssh".to_string(),
                        protocol: PortProtocol::Tcp,
                        port: 22,
                    }],
                    node_spec: None,
                    config: None,
                },
                NodeDefinition {
                    name: "r1".to_string(),
                    node_type_ref: NodeTypeRef {
                        type_: "cisco-vm".to_string(),
                        image: "cisco-ios".to_string(),
                        version: "15.2".to_string(),
                    },
                    ports: vec![],
                    node_spec: None,
                    config: Some("hostname r1".to_string()),
                },
            ],
        },
    );

    api.create(&PostParams::default(), &template)
        .await
        .expect("failed to create template");
    let fetched = api.get("ccna").await.expect("failed to get template");

    assert_eq!(fetched.spec, template.spec);
    assert!(fetched.spec.validate().is_ok());
    assert!(fetched.spec.nodes[0].is_exposed());
    assert!(!fetched.spec.nodes[1].is_exposed());

    delete_namespace(&client, NS).await;
}

/// Story: A NodeType declares whether its nodes run as pods or VMs
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_author_publishes_node_types() {
    let client = ensure_test_cluster().await.expect("failed to setup cluster");
    fresh_namespace(&client, NS).await.expect("failed to create namespace");
    let api: Api<NodeType> = Api::namespaced(client.clone(), NS);

    for (name, kind) in [("ubuntu-pod", "pod"), ("cisco-vm", "vm")] {
        let nt = NodeType::new(
            name,
            NodeTypeSpec {
                kind: kind.to_string(),
                node_spec: "containers: []".to_string(),
            },
        );
        api.create(&PostParams::default(), &nt)
            .await
            .expect("failed to create node type");
    }

    let pod = api.get("ubuntu-pod").await.expect("failed to get node type");
    let vm = api.get("cisco-vm").await.expect("failed to get node type");
    assert_eq!(pod.spec.workload_kind(), WorkloadKind::Pod);
    assert_eq!(vm.spec.workload_kind(), WorkloadKind::Vm);

    delete_namespace(&client, NS).await;
}

/// Story: A student requests a lab instance that has no status yet
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_student_requests_lab_instance() {
    let client = ensure_test_cluster().await.expect("failed to setup cluster");
    fresh_namespace(&client, NS).await.expect("failed to create namespace");
    let api: Api<LabInstance> = Api::namespaced(client.clone(), NS);

    let instance = LabInstance::new(
        "lab1",
        LabInstanceSpec {
            lab_template_reference: "ccna".to_string(),
        },
    );
    let created = api
        .create(&PostParams::default(), &instance)
        .await
        .expect("failed to create instance");

    assert!(created.metadata.uid.is_some());
    assert!(created.status.is_none());
    assert!(created.validate_identity().is_ok());

    delete_namespace(&client, NS).await;
}
