// ABOUTME: Composable capability traits for the container orchestrator.
// ABOUTME: Defines TaskQueries, SpecRegistry, ServiceControl, the ECS HTTP client and its signer.

mod ecs;
mod error;
mod signing;
mod wire;

pub use ecs::{EcsClient, TARGET_PREFIX, regional_endpoint};
pub use error::{QueryError, QueryErrorKind, TransportError};
pub use signing::{AwsSession, RequestSigner, SigningError};

use crate::types::{
    ClusterRef, RegisteredTaskSpec, ServiceRef, ServiceSnapshot, TaskId, TaskSpecId,
    TaskSpecification, TaskSummary,
};
use async_trait::async_trait;

/// Read-only task state queries used by the rollout monitor.
#[async_trait]
pub trait TaskQueries: Send + Sync {
    /// Current state of a service, including its desired count and the task
    /// specification it targets.
    async fn describe_service(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
    ) -> Result<ServiceSnapshot, QueryError>;

    /// IDs of the service's tasks whose desired status is running.
    async fn list_running_task_ids(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
    ) -> Result<Vec<TaskId>, QueryError>;

    /// Details for a set of tasks. Tasks the orchestrator no longer knows
    /// about are left out of the result.
    async fn describe_tasks(
        &self,
        cluster: &ClusterRef,
        ids: &[TaskId],
    ) -> Result<Vec<TaskSummary>, QueryError>;
}

/// Task specification storage.
#[async_trait]
pub trait SpecRegistry: Send + Sync {
    async fn describe_task_spec(&self, id: &TaskSpecId) -> Result<RegisteredTaskSpec, QueryError>;

    /// Register `spec` as a new revision of its family.
    async fn register_task_spec(
        &self,
        spec: &TaskSpecification,
    ) -> Result<RegisteredTaskSpec, QueryError>;
}

/// Mutating service and task operations.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Point the service at a different task specification.
    async fn update_service(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
        task_spec: &TaskSpecId,
    ) -> Result<ServiceSnapshot, QueryError>;

    /// Start one task from `spec` with the primary container's command
    /// replaced by `command`.
    async fn run_task(
        &self,
        cluster: &ClusterRef,
        spec: &RegisteredTaskSpec,
        command: &[String],
    ) -> Result<Vec<TaskSummary>, QueryError>;
}

/// Everything the deploy and run commands need.
pub trait Orchestrator: TaskQueries + SpecRegistry + ServiceControl {}

impl<T: TaskQueries + SpecRegistry + ServiceControl + ?Sized> Orchestrator for T {}
