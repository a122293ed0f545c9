//! Status aggregation across container and virtual machine workloads
//!
//! Pods count as running when their phase is `Running`; virtual machines when
//! KubeVirt reports them ready. The instance is `Running` only when both
//! fractions are complete, `Pending` while any pod is not running, and
//! `Not Ready` when only virtual machines lag behind. An empty collection is
//! vacuously complete, so a pod-only lab reports `0/0` VMs and can still run.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::warn;

use crate::crd::{LabInstance, LabInstanceStatus, LabPhase, VirtualMachine};
use crate::{Error, Result};

/// Whether a pod is in the `Running` phase
pub fn pod_is_running(pod: &Pod) -> bool {
    pod_phase(pod) == Some("Running")
}

/// Whether a pod has not reached a settled phase yet
pub fn pod_is_settling(pod: &Pod) -> bool {
    matches!(pod_phase(pod), None | Some("Pending"))
}

/// Whether a virtual machine is neither ready nor failed to start
pub fn vm_is_settling(vm: &VirtualMachine) -> bool {
    !vm.is_ready() && !vm.has_start_failure()
}

fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref().and_then(|s| s.phase.as_deref())
}

/// Fold observed workloads into a LabInstance status
///
/// At least one workload must be observed; an empty observation is a
/// BadRequest rather than a vacuous `Running`.
pub fn summarize(pods: &[Pod], vms: &[VirtualMachine]) -> Result<LabInstanceStatus> {
    if pods.is_empty() && vms.is_empty() {
        return Err(Error::bad_request(
            "status aggregation needs at least one pod or virtual machine",
        ));
    }

    let pods_running = pods
        .iter()
        .filter(|pod| {
            if let Some(phase @ ("Failed" | "Unknown")) = pod_phase(pod) {
                warn!(pod = %pod.name_any(), phase, "pod is not running");
            }
            pod_is_running(pod)
        })
        .count();

    let vms_ready = vms
        .iter()
        .filter(|vm| {
            if vm.has_start_failure() {
                let name = vm.metadata.name.as_deref().unwrap_or_default();
                warn!(vm = %name, state = vm.printable_status(), "virtual machine failed to start");
            }
            vm.is_ready()
        })
        .count();

    let phase = if pods_running < pods.len() {
        LabPhase::Pending
    } else if vms_ready < vms.len() {
        LabPhase::NotReady
    } else {
        LabPhase::Running
    };

    Ok(LabInstanceStatus::with_phase(phase)
        .pods(format!("{}/{}", pods_running, pods.len()))
        .vms(format!("{}/{}", vms_ready, vms.len())))
}

/// Aggregate observed workloads onto the instance's status in place
pub fn update_status(
    pods: &[Pod],
    vms: &[VirtualMachine],
    instance: &mut LabInstance,
) -> Result<()> {
    if instance.name_str().is_empty() {
        return Err(Error::bad_request("cannot update status of an unnamed LabInstance"));
    }
    instance.status = Some(summarize(pods, vms)?);
    Ok(())
}
