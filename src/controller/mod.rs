//! Controller implementation for LabInstance resources
//!
//! The reconciler is split along its seams: [`client`] is the only code that
//! talks to the API server, [`converge`] ensures a single object exists,
//! [`status`] folds workload readiness into the instance status, and
//! [`lab_instance`] drives the ordered walk over every dependency.

pub mod client;
mod context;
pub mod converge;
#[cfg(test)]
pub(crate) mod fake;
mod lab_instance;
pub mod resolve;
pub mod status;

pub use client::{KubeLabClient, LabClient};
pub use context::{Context, ContextBuilder, ControllerConfig};
pub use converge::{ensure, Convergence};
pub use lab_instance::{converge_pass, error_policy, reconcile, Progress};
pub use status::{summarize, update_status};
