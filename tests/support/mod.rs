// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory scripted orchestrator and fixture builders.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use nonempty::NonEmpty;
use parking_lot::Mutex;
use sortie::orchestrator::{QueryError, ServiceControl, SpecRegistry, TaskQueries};
use sortie::types::{
    ClusterRef, ContainerSpec, LifecycleStatus, RegisteredTaskSpec, ServiceDeployment, ServiceRef,
    ServiceSnapshot, TaskId, TaskSpecId, TaskSpecification, TaskSummary,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Once;

pub mod ecs_endpoint;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("sortie=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ACCOUNT_PREFIX: &str = "arn:aws:ecs:us-east-1:123456789012";

pub fn spec_id(family: &str, revision: u32) -> TaskSpecId {
    TaskSpecId::new(format!("{ACCOUNT_PREFIX}:task-definition/{family}:{revision}"))
}

pub fn task_id(n: u32) -> TaskId {
    TaskId::new(format!("{ACCOUNT_PREFIX}:task/prod/{n:032x}"))
}

pub fn container(name: &str, image: &str) -> ContainerSpec {
    ContainerSpec {
        name: name.to_string(),
        image: image.to_string(),
        command: Vec::new(),
        environment: Vec::new(),
        cpu: None,
        memory: None,
        memory_reservation: None,
        essential: Some(true),
        extra: BTreeMap::new(),
    }
}

pub fn task_spec(family: &str, primary: &str, sidecars: &[(&str, &str)]) -> TaskSpecification {
    let mut containers = NonEmpty::new(container(family, primary));
    for (name, image) in sidecars {
        containers.push(container(name, image));
    }

    TaskSpecification {
        family: family.to_string(),
        container_definitions: containers,
        cpu: Some("256".to_string()),
        memory: Some("512".to_string()),
        network_mode: Some("awsvpc".to_string()),
        volumes: Vec::new(),
        requires_compatibilities: vec!["FARGATE".to_string()],
        execution_role_arn: Some("arn:aws:iam::123456789012:role/exec".to_string()),
        task_role_arn: None,
    }
}

pub fn registered(revision: u32, spec: TaskSpecification) -> RegisteredTaskSpec {
    RegisteredTaskSpec {
        id: spec_id(&spec.family, revision),
        revision,
        spec,
    }
}

pub fn snapshot(name: &str, target: &TaskSpecId, desired: i64) -> ServiceSnapshot {
    ServiceSnapshot {
        name: name.to_string(),
        arn: format!("{ACCOUNT_PREFIX}:service/prod/{name}").as_str().into(),
        desired_count: desired,
        running_count: 0,
        pending_count: 0,
        task_spec: target.clone(),
        status: "ACTIVE".to_string(),
        deployments: Vec::new(),
    }
}

pub fn deployment(status: &str, spec: &TaskSpecId) -> ServiceDeployment {
    ServiceDeployment {
        id: format!("ecs-svc/{}", spec.short_name()),
        status: status.to_string(),
        task_spec: spec.clone(),
        desired_count: 1,
        running_count: 0,
    }
}

pub fn task(n: u32, spec: &TaskSpecId, status: LifecycleStatus) -> TaskSummary {
    TaskSummary {
        id: task_id(n),
        task_spec: spec.clone(),
        last_status: status,
        stopped_reason: None,
    }
}

pub fn cluster() -> ClusterRef {
    ClusterRef::named("prod")
}

pub fn service() -> ServiceRef {
    ServiceRef::named("web")
}

pub fn service_error(operation: &'static str) -> QueryError {
    QueryError::Service {
        operation,
        status: 500,
        code: "ServerException".to_string(),
        message: "internal failure".to_string(),
    }
}

/// What the next scripted call to an operation does.
enum Step {
    Pass,
    Fail(QueryError),
    /// Never answer.
    Hang,
}

struct FakeState {
    service: ServiceSnapshot,
    specs: HashMap<TaskSpecId, RegisteredTaskSpec>,
    /// Task listings returned by successive samples; the last one repeats.
    listings: VecDeque<Vec<TaskSummary>>,
    current: Vec<TaskSummary>,
    /// Per-operation script; unscripted calls pass.
    script: HashMap<&'static str, VecDeque<Step>>,
    calls: Vec<&'static str>,
    registered: Vec<TaskSpecification>,
    updates: Vec<TaskSpecId>,
    runs: Vec<(TaskSpecId, Vec<String>)>,
    ignore_updates: bool,
}

/// Scripted in-memory orchestrator.
///
/// Holds one service and the task specifications it knows. Every call is
/// recorded by operation name, and errors can be queued per operation.
pub struct FakeOrchestrator {
    state: Mutex<FakeState>,
}

impl FakeOrchestrator {
    /// A service currently running `current`, with `desired` tasks wanted.
    pub fn new(current: RegisteredTaskSpec, desired: i64) -> Self {
        let service = snapshot("web", &current.id, desired);
        let mut specs = HashMap::new();
        specs.insert(current.id.clone(), current);

        Self {
            state: Mutex::new(FakeState {
                service,
                specs,
                listings: VecDeque::new(),
                current: Vec::new(),
                script: HashMap::new(),
                calls: Vec::new(),
                registered: Vec::new(),
                updates: Vec::new(),
                runs: Vec::new(),
                ignore_updates: false,
            }),
        }
    }

    /// Queue the tasks returned by the next task listing.
    pub fn then_tasks(self, tasks: Vec<TaskSummary>) -> Self {
        self.state.lock().listings.push_back(tasks);
        self
    }

    fn script(self, operation: &'static str, step: Step) -> Self {
        self.state
            .lock()
            .script
            .entry(operation)
            .or_default()
            .push_back(step);
        self
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(self, operation: &'static str, error: QueryError) -> Self {
        self.script(operation, Step::Fail(error))
    }

    /// Let the next scripted call to `operation` succeed.
    pub fn pass_next(self, operation: &'static str) -> Self {
        self.script(operation, Step::Pass)
    }

    /// Make the next call to `operation` never return.
    pub fn hang_next(self, operation: &'static str) -> Self {
        self.script(operation, Step::Hang)
    }

    /// Report `spec` among the service's deployments.
    pub fn with_deployment(self, status: &str, spec: &TaskSpecId) -> Self {
        self.state
            .lock()
            .service
            .deployments
            .push(deployment(status, spec));
        self
    }

    /// Accept service updates without changing the service's target.
    pub fn ignoring_updates(self) -> Self {
        self.state.lock().ignore_updates = true;
        self
    }

    /// Point the service at `target` behind the caller's back.
    pub fn retarget_service(&self, target: &TaskSpecId) {
        self.state.lock().service.task_spec = target.clone();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    pub fn registered(&self) -> Vec<TaskSpecification> {
        self.state.lock().registered.clone()
    }

    pub fn updates(&self) -> Vec<TaskSpecId> {
        self.state.lock().updates.clone()
    }

    pub fn runs(&self) -> Vec<(TaskSpecId, Vec<String>)> {
        self.state.lock().runs.clone()
    }

    pub fn service_target(&self) -> TaskSpecId {
        self.state.lock().service.task_spec.clone()
    }

    /// Record a call to `operation` and play its next scripted step.
    async fn step(&self, operation: &'static str) -> Result<(), QueryError> {
        let next = {
            let mut state = self.state.lock();
            state.calls.push(operation);
            state
                .script
                .get_mut(operation)
                .and_then(VecDeque::pop_front)
        };
        match next {
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Pass) | None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskQueries for FakeOrchestrator {
    async fn describe_service(
        &self,
        _cluster: &ClusterRef,
        _service: &ServiceRef,
    ) -> Result<ServiceSnapshot, QueryError> {
        self.step("DescribeServices").await?;
        let state = self.state.lock();
        Ok(state.service.clone())
    }

    async fn list_running_task_ids(
        &self,
        _cluster: &ClusterRef,
        _service: &ServiceRef,
    ) -> Result<Vec<TaskId>, QueryError> {
        self.step("ListTasks").await?;
        let mut state = self.state.lock();
        if let Some(next) = state.listings.pop_front() {
            state.current = next;
        }
        Ok(state.current.iter().map(|t| t.id.clone()).collect())
    }

    async fn describe_tasks(
        &self,
        _cluster: &ClusterRef,
        ids: &[TaskId],
    ) -> Result<Vec<TaskSummary>, QueryError> {
        self.step("DescribeTasks").await?;
        let state = self.state.lock();
        Ok(state
            .current
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SpecRegistry for FakeOrchestrator {
    async fn describe_task_spec(&self, id: &TaskSpecId) -> Result<RegisteredTaskSpec, QueryError> {
        self.step("DescribeTaskDefinition").await?;
        let state = self.state.lock();
        state
            .specs
            .get(id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound {
                operation: "DescribeTaskDefinition",
                resource: id.to_string(),
            })
    }

    async fn register_task_spec(
        &self,
        spec: &TaskSpecification,
    ) -> Result<RegisteredTaskSpec, QueryError> {
        self.step("RegisterTaskDefinition").await?;
        let mut state = self.state.lock();
        let revision = state
            .specs
            .values()
            .filter(|s| s.spec.family == spec.family)
            .map(|s| s.revision)
            .max()
            .unwrap_or(0)
            + 1;

        let new = registered(revision, spec.clone());
        state.specs.insert(new.id.clone(), new.clone());
        state.registered.push(spec.clone());
        Ok(new)
    }
}

#[async_trait]
impl ServiceControl for FakeOrchestrator {
    async fn update_service(
        &self,
        _cluster: &ClusterRef,
        _service: &ServiceRef,
        task_spec: &TaskSpecId,
    ) -> Result<ServiceSnapshot, QueryError> {
        self.step("UpdateService").await?;
        let mut state = self.state.lock();
        state.updates.push(task_spec.clone());
        if !state.ignore_updates {
            state.service.task_spec = task_spec.clone();
        }
        Ok(state.service.clone())
    }

    async fn run_task(
        &self,
        _cluster: &ClusterRef,
        spec: &RegisteredTaskSpec,
        command: &[String],
    ) -> Result<Vec<TaskSummary>, QueryError> {
        self.step("RunTask").await?;
        let mut state = self.state.lock();
        state.runs.push((spec.id.clone(), command.to_vec()));
        Ok(vec![task(9000, &spec.id, LifecycleStatus::Provisioning)])
    }
}
