// ABOUTME: Single-step convergence check for a service rollout.
// ABOUTME: RolloutMonitor adds sticky terminal states on top of the stateless sample.

use parking_lot::Mutex;

use super::outcome::{DIVERGENCE_CONFIRMATIONS, DeploymentOutcome, RolloutState};
use crate::orchestrator::{QueryError, TaskQueries};
use crate::types::{ClusterRef, LifecycleStatus, ServiceRef, TaskSpecId};

/// Check once whether `service` has a running task on `target`.
///
/// Issues at most one service read, one task listing and one task describe,
/// in that order, and stops at the first query that fails. Query errors are
/// returned untouched.
///
/// A running task on `target` wins over the service read, which can lag
/// behind a just-accepted update. `Failed` is reported only when no task
/// runs on `target` and neither the service nor any of its deployments
/// refer to it.
pub async fn sample<Q: TaskQueries + ?Sized>(
    client: &Q,
    cluster: &ClusterRef,
    service: &ServiceRef,
    target: &TaskSpecId,
) -> Result<DeploymentOutcome, QueryError> {
    let snapshot = client.describe_service(cluster, service).await?;

    if snapshot.desired_count <= 0 {
        tracing::debug!(service = %service, desired = snapshot.desired_count, "nothing to wait for");
        return Ok(DeploymentOutcome::NoDesiredCapacity);
    }

    let ids = client.list_running_task_ids(cluster, service).await?;
    let tasks = if ids.is_empty() {
        Vec::new()
    } else {
        client.describe_tasks(cluster, &ids).await?
    };

    let on_target = tasks
        .iter()
        .filter(|t| t.task_spec == *target)
        .collect::<Vec<_>>();

    if on_target
        .iter()
        .any(|t| t.last_status == LifecycleStatus::Running)
    {
        return Ok(DeploymentOutcome::Running(target.clone()));
    }

    if !snapshot.targets(target) {
        return Ok(DeploymentOutcome::Failed(format!(
            "service {} now targets {} instead of {}",
            service,
            snapshot.task_spec.short_name(),
            target.short_name()
        )));
    }

    tracing::debug!(
        service = %service,
        tasks = tasks.len(),
        on_target = on_target.len(),
        "target specification not running yet"
    );
    Ok(DeploymentOutcome::NotYetRunning)
}

/// Tracks one rollout of `service` onto `target`.
///
/// Each [`sample`](Self::sample) call performs one step and returns at once;
/// the caller decides how often to call it and when to give up. Once a
/// terminal outcome is reached it is reported again on every call without
/// querying the orchestrator.
///
/// A `Failed` sample only settles the rollout after
/// [`DIVERGENCE_CONFIRMATIONS`] consecutive ones; until then the monitor
/// reports `NotYetRunning`.
pub struct RolloutMonitor<'a, Q: ?Sized> {
    client: &'a Q,
    cluster: ClusterRef,
    service: ServiceRef,
    target: TaskSpecId,
    state: Mutex<RolloutState>,
}

impl<'a, Q: TaskQueries + ?Sized> RolloutMonitor<'a, Q> {
    pub fn new(client: &'a Q, cluster: ClusterRef, service: ServiceRef, target: TaskSpecId) -> Self {
        Self {
            client,
            cluster,
            service,
            target,
            state: Mutex::new(RolloutState::Start),
        }
    }

    pub fn cluster(&self) -> &ClusterRef {
        &self.cluster
    }

    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    pub fn target(&self) -> &TaskSpecId {
        &self.target
    }

    pub fn state(&self) -> RolloutState {
        self.state.lock().clone()
    }

    /// Perform one sampling step.
    ///
    /// A query error leaves the state unchanged, so the next call retries
    /// the same step.
    pub async fn sample(&self) -> Result<DeploymentOutcome, QueryError> {
        let settled = self.state.lock().outcome();
        if let Some(outcome) = settled {
            return Ok(outcome);
        }

        let outcome = sample(self.client, &self.cluster, &self.service, &self.target).await?;
        Ok(self.record(outcome))
    }

    /// Stop the rollout as aborted unless it already finished.
    pub fn abort(&self) -> DeploymentOutcome {
        self.record(DeploymentOutcome::Aborted)
    }

    /// Stop the rollout as timed out unless it already finished.
    pub fn time_out(&self) -> DeploymentOutcome {
        self.record(DeploymentOutcome::TimedOut)
    }

    fn record(&self, outcome: DeploymentOutcome) -> DeploymentOutcome {
        let mut state = self.state.lock();

        // Another caller may have settled the rollout while this sample was in flight.
        if let Some(settled) = state.outcome() {
            return settled;
        }

        *state = state.after(&outcome);
        match state.outcome() {
            Some(settled) => {
                tracing::info!(
                    cluster = %self.cluster,
                    service = %self.service,
                    target = %self.target.short_name(),
                    outcome = %settled,
                    "rollout settled"
                );
                settled
            }
            None => {
                if let DeploymentOutcome::Failed(reason) = &outcome {
                    tracing::warn!(
                        service = %self.service,
                        confirmations = DIVERGENCE_CONFIRMATIONS,
                        "rollout may have diverged: {}",
                        reason
                    );
                }
                DeploymentOutcome::NotYetRunning
            }
        }
    }
}
