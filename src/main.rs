//! Labweaver operator - converges lab topologies into pods and virtual machines

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::api::DynamicObject;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use labweaver::controller::{error_policy, reconcile, Context, ControllerConfig};
use labweaver::crd::{HasApiResource, LabInstance, LabTemplate, NodeType, VirtualMachine};
use labweaver::resources::{BuildSettings, BuilderRegistry, DependencyKind};
use labweaver::{DEFAULT_INGRESS_CLASS, DEFAULT_TERMINAL_IMAGE, FIELD_MANAGER};

/// Labweaver - Kubernetes operator for network lab topologies
#[derive(Parser, Debug)]
#[command(name = "labweaver", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Log output format
    #[arg(long, env = "LABWEAVER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as controller (default mode)
    ///
    /// Watches LabInstance resources and converges each into its network,
    /// web terminal, node workloads and exposure objects.
    Controller(ControllerArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Controller mode arguments
#[derive(Parser, Debug)]
struct ControllerArgs {
    /// Only watch LabInstances in this namespace (all namespaces when unset)
    #[arg(long, env = "LABWEAVER_NAMESPACE")]
    namespace: Option<String>,

    /// Image of the shared web terminal pod
    #[arg(long, env = "LABWEAVER_TERMINAL_IMAGE", default_value = DEFAULT_TERMINAL_IMAGE)]
    terminal_image: String,

    /// Ingress class of per-node terminal ingresses
    #[arg(long, env = "LABWEAVER_INGRESS_CLASS", default_value = DEFAULT_INGRESS_CLASS)]
    ingress_class: String,

    /// Host rule of per-node terminal ingresses (any host when unset)
    #[arg(long, env = "LABWEAVER_INGRESS_HOST")]
    ingress_host: Option<String>,

    /// Run without KubeVirt; VM nodes fail as unsupported
    #[arg(long, env = "LABWEAVER_DISABLE_VMS")]
    disable_vms: bool,

    /// Delay before the pass following a create, in milliseconds
    #[arg(long, env = "LABWEAVER_REQUEUE_DELAY_MS", default_value = "2000")]
    requeue_delay_ms: u64,

    /// Wait before re-reading unsettled workloads, in milliseconds (0 disables)
    #[arg(long, env = "LABWEAVER_SETTLE_DELAY_MS", default_value = "2000")]
    settle_delay_ms: u64,
}

impl ControllerArgs {
    fn config(&self) -> ControllerConfig {
        ControllerConfig {
            requeue_delay: Duration::from_millis(self.requeue_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            resources: BuildSettings {
                terminal_image: self.terminal_image.clone(),
                ingress_class: self.ingress_class.clone(),
                ingress_host: self.ingress_host.clone(),
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match cli.log_format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    if cli.crd {
        let crds = [LabInstance::crd(), LabTemplate::crd(), NodeType::crd()];
        for crd in crds {
            let yaml = serde_yaml::to_string(&crd)
                .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
            println!("---\n{yaml}");
        }
        return Ok(());
    }

    match cli.command {
        Some(Commands::Controller(args)) => run_controller(args).await,
        None => run_controller(ControllerArgs::parse_from(["controller"])).await,
    }
}

/// Install or update the operator's own CRDs using server-side apply
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use kube::api::{Patch, PatchParams};

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for crd in [LabInstance::crd(), LabTemplate::crd(), NodeType::crd()] {
        let name = crd.metadata.name.clone().unwrap_or_default();
        tracing::info!(crd = %name, "Installing CRD...");
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to install CRD {}: {}", name, e))?;
    }

    tracing::info!("All Labweaver CRDs installed/updated");
    Ok(())
}

/// Watch API for a kind, scoped like the LabInstance watch
fn scoped<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Run the LabInstance controller until a shutdown signal arrives
async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    tracing::info!("Labweaver controller starting...");

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    ensure_crds_installed(&client).await?;

    let mut registry = BuilderRegistry::new();
    if args.disable_vms {
        tracing::warn!("VM support disabled, VM nodes will fail as unsupported");
        registry = registry.without(DependencyKind::NodeVm);
    }

    let ctx = Arc::new(
        Context::builder(client.clone())
            .config(args.config())
            .registry(registry)
            .build(),
    );

    let namespace = args.namespace.as_deref();
    if let Some(ns) = namespace {
        tracing::info!(namespace = %ns, "Watching a single namespace");
    }

    let mut controller = Controller::new(
        scoped::<LabInstance>(&client, namespace),
        WatcherConfig::default(),
    )
    .owns(scoped::<Pod>(&client, namespace), WatcherConfig::default())
    .owns(scoped::<Service>(&client, namespace), WatcherConfig::default())
    .owns(scoped::<Ingress>(&client, namespace), WatcherConfig::default())
    .owns(scoped::<ServiceAccount>(&client, namespace), WatcherConfig::default())
    .owns(scoped::<Role>(&client, namespace), WatcherConfig::default())
    .owns(scoped::<RoleBinding>(&client, namespace), WatcherConfig::default());

    if ctx.registry.supports(DependencyKind::NodeVm) {
        let vm_resource = VirtualMachine::api_resource();
        let vms: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(client.clone(), ns, &vm_resource),
            None => Api::all_with(client.clone(), &vm_resource),
        };
        controller = controller.owns_with(vms, vm_resource, WatcherConfig::default());
    }

    tracing::info!("Starting LabInstance controller...");
    controller
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "LabInstance reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "LabInstance reconciliation error");
                }
            }
        })
        .await;

    tracing::info!("Labweaver controller shutting down");
    Ok(())
}
