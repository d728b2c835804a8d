// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Image references, task specifications, and orchestrator resource handles.

mod id;
mod image_ref;
mod resource;
mod task_spec;

pub use id::{ClusterArn, Id, ServiceArn, TaskId, TaskSpecId};
pub use image_ref::{ImageReference, ParseImageRefError};
pub use resource::{
    ClusterRef, LifecycleStatus, ServiceDeployment, ServiceRef, ServiceSnapshot, TaskSummary,
};
pub use task_spec::{ContainerSpec, EnvVar, RegisteredTaskSpec, TaskSpecification, Volume};
