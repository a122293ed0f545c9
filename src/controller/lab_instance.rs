//! LabInstance controller implementation
//!
//! Each pass walks the dependency order below and stops at the first object
//! it had to create, so a pass creates at most one object:
//!
//! 1. network attachment
//! 2. terminal service account, role, role binding
//! 3. terminal pod and service
//! 4. per node, in template order: NodeType, workload (pod or VM), then the
//!    remote-access service and ingress when the node declares ports
//!
//! Once every object exists the observed workloads are folded into the
//! instance status.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, error, info, instrument};

use super::context::Context;
use super::converge::{ensure, Convergence};
use super::resolve::{resolve_node_type, resolve_template};
use super::status::{pod_is_settling, summarize, vm_is_settling};
use crate::crd::{from_dynamic, LabInstance, LabInstanceStatus, VirtualMachine, WorkloadKind};
use crate::render::ResolvedNode;
use crate::resources::{BuildRequest, DependencyKind, ResourceBuilder};
use crate::{Error, Result};

/// Result of one convergence pass
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    /// An object was created; the pass stopped there
    Created {
        /// Kind of the created object
        kind: DependencyKind,
        /// Name of the created object
        name: String,
    },
    /// Every dependency exists; carries the aggregated status
    Converged(LabInstanceStatus),
}

/// Run one convergence pass for an instance
pub async fn converge_pass(instance: &LabInstance, ctx: &Context) -> Result<Progress> {
    instance.validate_identity()?;

    let client = ctx.client.as_ref();
    let namespace = instance.namespace_str();
    let template = resolve_template(client, instance).await?;

    let shared = BuildRequest::shared(instance, &ctx.config.resources, &ctx.renderer);
    for kind in DependencyKind::SHARED {
        if let Convergence::Created(obj) = ensure(client, &ctx.registry, kind, &shared).await? {
            return Ok(created(kind, obj));
        }
    }

    let mut pods = Vec::new();
    let mut vms = Vec::new();
    for node in &template.spec.nodes {
        let node_type = resolve_node_type(client, namespace, &node.node_type_ref).await?;
        let resolved = ResolvedNode::new(node, &node_type.spec);
        let req = shared.for_node(resolved);

        let kind = match resolved.workload_kind() {
            WorkloadKind::Pod => DependencyKind::NodePod,
            WorkloadKind::Vm => DependencyKind::NodeVm,
        };
        let outcome = ensure(client, &ctx.registry, kind, &req).await?;
        if outcome.is_created() {
            return Ok(created(kind, outcome.into_object()));
        }
        let workload = outcome.into_object();
        match kind {
            DependencyKind::NodeVm => vms.push(from_dynamic::<VirtualMachine>(&workload)?),
            _ => pods.push(from_dynamic::<Pod>(&workload)?),
        }

        if node.is_exposed() {
            for kind in [
                DependencyKind::RemoteAccessService,
                DependencyKind::RemoteAccessIngress,
            ] {
                if let Convergence::Created(obj) = ensure(client, &ctx.registry, kind, &req).await? {
                    return Ok(created(kind, obj));
                }
            }
        }
    }

    if !ctx.config.settle_delay.is_zero() {
        settle(ctx, namespace, &mut pods, &mut vms).await?;
    }

    Ok(Progress::Converged(summarize(&pods, &vms)?))
}

fn created(kind: DependencyKind, obj: kube::api::DynamicObject) -> Progress {
    Progress::Created {
        kind,
        name: obj.name_any(),
    }
}

/// Re-read workloads that have not settled yet, once, after the settle delay
async fn settle(
    ctx: &Context,
    namespace: &str,
    pods: &mut [Pod],
    vms: &mut [VirtualMachine],
) -> Result<()> {
    if !pods.iter().any(pod_is_settling) && !vms.iter().any(vm_is_settling) {
        return Ok(());
    }

    debug!(delay = ?ctx.config.settle_delay, "waiting for workloads to settle");
    tokio::time::sleep(ctx.config.settle_delay).await;

    let client = ctx.client.as_ref();
    let pod_resource = ctx.registry.get(DependencyKind::NodePod)?.api_resource();
    for pod in pods.iter_mut().filter(|p| pod_is_settling(p)) {
        if let Some(obj) = client.get_object(&pod_resource, namespace, &pod.name_any()).await? {
            *pod = from_dynamic(&obj)?;
        }
    }

    if !vms.is_empty() {
        let vm_resource = ctx.registry.get(DependencyKind::NodeVm)?.api_resource();
        for vm in vms.iter_mut().filter(|v| vm_is_settling(v)) {
            let name = vm.metadata.name.clone().unwrap_or_default();
            if let Some(obj) = client.get_object(&vm_resource, namespace, &name).await? {
                *vm = from_dynamic(&obj)?;
            }
        }
    }

    Ok(())
}

/// Reconcile a LabInstance resource
///
/// Creating an object requeues after `requeue_delay`; a missing LabTemplate
/// or NodeType requeues after `missing_reference_delay` without an error.
/// A converged instance gets its status patched when it changed and then
/// waits for the next change event from itself or an owned object.
#[instrument(skip(instance, ctx), fields(instance = %instance.name_any(), namespace = %instance.namespace().unwrap_or_default()))]
pub async fn reconcile(instance: Arc<LabInstance>, ctx: Arc<Context>) -> Result<Action> {
    debug!("reconciling lab instance");

    match converge_pass(&instance, &ctx).await {
        Ok(Progress::Created { kind, name }) => {
            debug!(%kind, %name, "created dependency, requeueing");
            Ok(Action::requeue(ctx.config.requeue_delay))
        }
        Ok(Progress::Converged(status)) => {
            if instance.status.as_ref() != Some(&status) {
                ctx.client
                    .patch_status(instance.namespace_str(), instance.name_str(), &status)
                    .await?;
                info!(
                    status = ?status.status,
                    pods = %status.num_pods_running,
                    vms = %status.num_vms_running,
                    "updated status"
                );
            }
            Ok(Action::await_change())
        }
        Err(e) if e.is_not_found() => {
            info!(error = %e, "waiting for referenced object");
            Ok(Action::requeue(ctx.config.missing_reference_delay))
        }
        Err(e) => Err(e),
    }
}

/// Error policy for the LabInstance controller
///
/// Faults that a retry cannot fix wait for the next spec change; everything
/// else is retried after `error_backoff`.
pub fn error_policy(instance: Arc<LabInstance>, error: &Error, ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        instance = %instance.name_any(),
        "reconciliation failed"
    );

    if error.is_retryable() {
        Action::requeue(ctx.config.error_backoff)
    } else {
        Action::await_change()
    }
}
