//! Shared controller state

use std::sync::Arc;
use std::time::Duration;

use kube::Client;

use super::client::{KubeLabClient, LabClient};
use crate::render::ManifestRenderer;
use crate::resources::{BuildSettings, BuilderRegistry};

/// Tunables of the LabInstance controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay before the next pass after an object was created
    pub requeue_delay: Duration,
    /// Delay before re-checking a missing LabTemplate or NodeType
    pub missing_reference_delay: Duration,
    /// Delay before retrying after a retryable error
    pub error_backoff: Duration,
    /// Wait before re-reading workloads that have not settled yet (zero disables)
    pub settle_delay: Duration,
    /// Knobs handed to the resource builders
    pub resources: BuildSettings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            requeue_delay: Duration::from_secs(2),
            missing_reference_delay: Duration::from_secs(30),
            error_backoff: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
            resources: BuildSettings::default(),
        }
    }
}

/// Controller context containing shared state and clients
///
/// Use [`ContextBuilder`] to construct instances:
///
/// ```ignore
/// let ctx = Context::builder(client)
///     .config(ControllerConfig::default())
///     .registry(BuilderRegistry::new().without(DependencyKind::NodeVm))
///     .build();
/// ```
pub struct Context {
    /// Control-plane client (trait object for testability)
    pub client: Arc<dyn LabClient>,
    /// Dispatch table of dependency builders
    pub registry: BuilderRegistry,
    /// Node manifest renderer
    pub renderer: ManifestRenderer,
    /// Controller tunables
    pub config: ControllerConfig,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client) -> ContextBuilder {
        ContextBuilder::new(client)
    }

    /// Create a context for testing with a mock or fake client
    ///
    /// Readiness settling is disabled so tests never sleep.
    #[cfg(test)]
    pub fn for_testing(client: Arc<dyn LabClient>) -> Self {
        Self {
            client,
            registry: BuilderRegistry::new(),
            renderer: ManifestRenderer::new(),
            config: ControllerConfig {
                settle_delay: Duration::ZERO,
                ..Default::default()
            },
        }
    }
}

/// Builder for constructing [`Context`] instances
pub struct ContextBuilder {
    client: Client,
    registry: BuilderRegistry,
    config: ControllerConfig,
}

impl ContextBuilder {
    fn new(client: Client) -> Self {
        Self {
            client,
            registry: BuilderRegistry::new(),
            config: ControllerConfig::default(),
        }
    }

    /// Set the controller tunables
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the builder registry
    pub fn registry(mut self, registry: BuilderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the Context
    pub fn build(self) -> Context {
        Context {
            client: Arc::new(KubeLabClient::new(self.client)),
            registry: self.registry,
            renderer: ManifestRenderer::new(),
            config: self.config,
        }
    }
}
