// ABOUTME: Request and response bodies for the ECS JSON 1.1 protocol.
// ABOUTME: Only the fields sortie sends or reads are modelled.

use serde::{Deserialize, Serialize};

use crate::types::{RegisteredTaskSpec, ServiceSnapshot, TaskId, TaskSummary};

/// ListTasks and DescribeTasks both cap a single page at this many tasks.
pub(crate) const MAX_TASKS_PER_PAGE: usize = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeServicesRequest<'a> {
    pub cluster: &'a str,
    pub services: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeServicesResponse {
    #[serde(default)]
    pub services: Vec<ServiceSnapshot>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListTasksRequest<'a> {
    pub cluster: &'a str,
    pub service_name: &'a str,
    pub desired_status: &'static str,
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListTasksResponse {
    #[serde(default)]
    pub task_arns: Vec<TaskId>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeTasksRequest<'a> {
    pub cluster: &'a str,
    pub tasks: &'a [TaskId],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TasksResponse {
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeTaskDefinitionRequest<'a> {
    pub task_definition: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskDefinitionResponse {
    pub task_definition: RegisteredTaskSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateServiceRequest<'a> {
    pub cluster: &'a str,
    pub service: &'a str,
    pub task_definition: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateServiceResponse {
    pub service: ServiceSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunTaskRequest<'a> {
    pub cluster: &'a str,
    pub task_definition: &'a str,
    pub count: u32,
    pub started_by: &'a str,
    pub overrides: TaskOverride<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskOverride<'a> {
    pub container_overrides: Vec<ContainerOverride<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContainerOverride<'a> {
    pub name: &'a str,
    pub command: &'a [String],
}

/// Per-item failure reported alongside a successful response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Failure {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Failure {
    pub fn arn(&self) -> &str {
        self.arn.as_deref().unwrap_or("<unknown>")
    }

    pub fn reason(&self) -> String {
        match (&self.reason, &self.detail) {
            (Some(reason), Some(detail)) => format!("{reason} ({detail})"),
            (Some(reason), None) => reason.clone(),
            (None, Some(detail)) => detail.clone(),
            (None, None) => "unspecified".to_string(),
        }
    }
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// `com.amazonaws.ecs#ClusterNotFoundException` -> `ClusterNotFoundException`.
    pub fn code(&self) -> String {
        self.error_type
            .as_deref()
            .map(|t| t.rsplit_once('#').map(|(_, code)| code).unwrap_or(t))
            .unwrap_or("UnknownError")
            .to_string()
    }
}
