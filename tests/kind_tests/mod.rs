//! Integration tests for the Labweaver operator
//!
//! These tests require a Kubernetes cluster (kind) and tell the story of how
//! lab authors and students interact with Labweaver.
//!
//! # Test Organization
//!
//! - `crd_operations`: Stories about creating and reading LabTemplate,
//!   NodeType and LabInstance resources through the Kubernetes API
//!
//! - `lab_lifecycle`: Stories about the controller converging a LabInstance
//!   into its network, terminal, workloads and exposure objects
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test kind -- --ignored --test-threads=1
//! ```

mod crd_operations;
mod helpers;
mod lab_lifecycle;
