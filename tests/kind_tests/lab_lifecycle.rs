//! Integration tests for LabInstance convergence
//!
//! These tests drive the controller's convergence pass directly against a
//! real API server, one pass at a time, the way the controller runtime would.

use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, PostParams};
use kube::Client;

use labweaver::controller::{converge_pass, Context, ControllerConfig, Progress};
use labweaver::crd::{
    LabInstance, LabInstanceSpec, LabPhase, LabTemplate, LabTemplateSpec, NodeDefinition,
    NodeType, NodeTypeRef, NodeTypeSpec, Port, PortProtocol,
};
use labweaver::resources::{BuilderRegistry, DependencyKind};
use labweaver::APP_LABEL;

use super::helpers::{delete_namespace, ensure_test_cluster, fresh_namespace};

const NS: &str = "labweaver-lifecycle-test";

const ALPINE_POD: &str = r#"containers:
  - name: {{ node.name }}
    image: {{ node.image }}:{{ node.version }}
    command: ["sleep", "infinity"]
    ports:
{%- for p in node.ports %}
      - name: {{ p.name }}
        containerPort: {{ p.port }}
        protocol: {{ p.protocol }}
{%- endfor %}
"#;

async fn seed_lab(client: &Client) -> LabInstance {
    let node_types: Api<NodeType> = Api::namespaced(client.clone(), NS);
    node_types
        .create(
            &PostParams::default(),
            &NodeType::new(
                "alpine-pod",
                NodeTypeSpec {
                    kind: "pod".to_string(),
                    node_spec: ALPINE_POD.to_string(),
                },
            ),
        )
        .await
        .expect("failed to create node type");

    let templates: Api<LabTemplate> = Api::namespaced(client.clone(), NS);
    templates
        .create(
            &PostParams::default(),
            &LabTemplate::new(
                "starter",
                LabTemplateSpec {
                    nodes: vec![NodeDefinition {
                        name: "pc1".to_string(),
                        node_type_ref: NodeTypeRef {
                            type_: "alpine-pod".to_string(),
                            image: "alpine".to_string(),
                            version: "3.20".to_string(),
                        },
                        ports: vec![Port {
                            name: "ssh".to_string(),
                            protocol: PortProtocol::Tcp,
                            port: 22,
                        }],
                        node_spec: None,
                        config: None,
                    }],
                },
            ),
        )
        .await
        .expect("failed to create template");

    let instances: Api<LabInstance> = Api::namespaced(client.clone(), NS);
    instances
        .create(
            &PostParams::default(),
            &LabInstance::new(
                "lab1",
                LabInstanceSpec {
                    lab_template_reference: "starter".to_string(),
                },
            ),
        )
        .await
        .expect("failed to create instance")
}

fn context(client: &Client) -> Context {
    Context::builder(client.clone())
        .config(ControllerConfig {
            settle_delay: std::time::Duration::ZERO,
            ..Default::default()
        })
        .registry(BuilderRegistry::new().without(DependencyKind::NodeVm))
        .build()
}

/// Story: A student's lab converges one object per pass
///
/// Expected behavior:
/// - Each pass creates exactly one object until everything exists
/// - The node pod carries the owner reference, app label and networks annotation
/// - The remote-access service selects the pod through the app label
/// - The ingress routes `/<namespace>/<instance>/<node>` to the terminal
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_lab_instance_converges_step_by_step() {
    let client = ensure_test_cluster().await.expect("failed to setup cluster");
    fresh_namespace(&client, NS).await.expect("failed to create namespace");
    let instance = seed_lab(&client).await;
    let ctx = context(&client);

    let mut created = Vec::new();
    let status = loop {
        match converge_pass(&instance, &ctx).await.expect("pass failed") {
            Progress::Created { kind, name } => created.push((kind, name)),
            Progress::Converged(status) => break status,
        }
        assert!(created.len() <= 9, "too many creates: {:?}", created);
    };

    let kinds: Vec<_> = created.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        kinds,
        vec![
            DependencyKind::NetworkAttachment,
            DependencyKind::ServiceAccount,
            DependencyKind::Role,
            DependencyKind::RoleBinding,
            DependencyKind::TerminalPod,
            DependencyKind::TerminalService,
            DependencyKind::NodePod,
            DependencyKind::RemoteAccessService,
            DependencyKind::RemoteAccessIngress,
        ]
    );
    assert_eq!(status.num_vms_running, "0/0");

    let pods: Api<Pod> = Api::namespaced(client.clone(), NS);
    let pod = pods.get("lab1-pc1").await.expect("node pod missing");
    let owner = &pod.metadata.owner_references.as_ref().expect("no owner")[0];
    assert_eq!(owner.kind, "LabInstance");
    assert_eq!(owner.uid, instance.metadata.uid.clone().unwrap_or_default());
    assert_eq!(
        pod.metadata.labels.as_ref().and_then(|l| l.get(APP_LABEL)).map(String::as_str),
        Some("lab1-pc1-remote-access")
    );

    let services: Api<Service> = Api::namespaced(client.clone(), NS);
    let svc = services.get("lab1-pc1-remote-access").await.expect("service missing");
    let spec = svc.spec.expect("service has no spec");
    assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));

    let ingresses: Api<Ingress> = Api::namespaced(client.clone(), NS);
    let ing = ingresses.get("lab1-pc1-ingress").await.expect("ingress missing");
    let path = ing.spec.and_then(|s| s.rules).expect("ingress has no rules")[0]
        .http
        .clone()
        .expect("rule has no http")
        .paths[0]
        .path
        .clone();
    assert_eq!(path.as_deref(), Some("/labweaver-lifecycle-test/lab1/pc1"));

    // a second pass is a no-op
    assert!(matches!(
        converge_pass(&instance, &ctx).await.expect("pass failed"),
        Progress::Converged(_)
    ));

    delete_namespace(&client, NS).await;
}

/// Story: The lab reports Running once the node pod starts
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_lab_reports_running_once_pod_starts() {
    let client = ensure_test_cluster().await.expect("failed to setup cluster");
    fresh_namespace(&client, NS).await.expect("failed to create namespace");
    let instance = seed_lab(&client).await;
    let ctx = context(&client);

    let mut phase = None;
    for _ in 0..120 {
        if let Progress::Converged(status) = converge_pass(&instance, &ctx).await.expect("pass failed") {
            phase = status.status;
            if phase == Some(LabPhase::Running) {
                assert_eq!(status.num_pods_running, "1/1");
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
    assert_eq!(phase, Some(LabPhase::Running));

    delete_namespace(&client, NS).await;
}
