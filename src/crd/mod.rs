//! Custom Resource Definitions for Labweaver
//!
//! This module contains the CRDs the operator serves (LabInstance,
//! LabTemplate, NodeType) and the third-party kinds it creates.

mod external;
mod lab_instance;
mod lab_template;
mod node_type;
mod types;

pub use external::{
    build_api_resource, from_dynamic, to_dynamic, HasApiResource, NetworkAttachmentDefinition,
    NetworkAttachmentDefinitionSpec, VirtualMachine, VirtualMachineInstanceTemplate,
    VirtualMachineSpec, VirtualMachineStatus,
};
pub use lab_instance::{LabInstance, LabInstanceSpec, LabInstanceStatus};
pub use lab_template::{LabTemplate, LabTemplateSpec, NodeDefinition};
pub use node_type::{NodeType, NodeTypeSpec};
pub use types::{LabPhase, NodeTypeRef, Port, PortProtocol, WorkloadKind};
