// ABOUTME: Cluster and service identity handles plus live orchestrator state.
// ABOUTME: Service snapshots and task summaries as read from the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{ClusterArn, ServiceArn, TaskId, TaskSpecId};

/// A cluster, addressed by name or ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterRef {
    pub name: String,
    pub arn: Option<ClusterArn>,
}

impl ClusterRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: None,
        }
    }

    /// The identifier to send to the orchestrator (ARN when known).
    pub fn identifier(&self) -> &str {
        self.arn.as_ref().map(|a| a.as_str()).unwrap_or(&self.name)
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A service within a cluster, addressed by name or ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub name: String,
    pub arn: Option<ServiceArn>,
}

impl ServiceRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: None,
        }
    }

    pub fn identifier(&self) -> &str {
        self.arn.as_ref().map(|a| a.as_str()).unwrap_or(&self.name)
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Point-in-time view of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    #[serde(rename = "serviceName")]
    pub name: String,

    #[serde(rename = "serviceArn")]
    pub arn: ServiceArn,

    #[serde(default)]
    pub desired_count: i64,

    #[serde(default)]
    pub running_count: i64,

    #[serde(default)]
    pub pending_count: i64,

    /// The task specification the service is currently targeting.
    #[serde(rename = "taskDefinition")]
    pub task_spec: TaskSpecId,

    #[serde(default)]
    pub status: String,

    /// Deployments still in progress or active, newest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<ServiceDeployment>,
}

impl ServiceSnapshot {
    pub fn to_service_ref(&self) -> ServiceRef {
        ServiceRef {
            name: self.name.clone(),
            arn: Some(self.arn.clone()),
        }
    }

    /// Whether the service or any of its deployments still targets `spec`.
    pub fn targets(&self, spec: &TaskSpecId) -> bool {
        self.task_spec == *spec || self.deployments.iter().any(|d| d.task_spec == *spec)
    }
}

/// One deployment of a service: a task specification being rolled in or out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeployment {
    #[serde(default)]
    pub id: String,

    /// `PRIMARY` for the newest deployment, `ACTIVE` for ones draining.
    #[serde(default)]
    pub status: String,

    #[serde(rename = "taskDefinition")]
    pub task_spec: TaskSpecId,

    #[serde(default)]
    pub desired_count: i64,

    #[serde(default)]
    pub running_count: i64,
}

/// Lifecycle status reported for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleStatus::Provisioning => "PROVISIONING",
            LifecycleStatus::Pending => "PENDING",
            LifecycleStatus::Activating => "ACTIVATING",
            LifecycleStatus::Running => "RUNNING",
            LifecycleStatus::Deactivating => "DEACTIVATING",
            LifecycleStatus::Stopping => "STOPPING",
            LifecycleStatus::Deprovisioning => "DEPROVISIONING",
            LifecycleStatus::Stopped => "STOPPED",
            LifecycleStatus::Deleted => "DELETED",
            LifecycleStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// The parts of a task the rollout check looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    #[serde(rename = "taskArn")]
    pub id: TaskId,

    #[serde(rename = "taskDefinitionArn")]
    pub task_spec: TaskSpecId,

    pub last_status: LifecycleStatus,

    #[serde(default)]
    pub stopped_reason: Option<String>,
}
