// ABOUTME: Check command implementation.
// ABOUTME: Takes a single rollout sample for the service's current target.

use super::report::settle;
use sortie::deploy::RolloutMonitor;
use sortie::error::Result;
use sortie::orchestrator::TaskQueries;
use sortie::output::Output;
use sortie::types::{ClusterRef, ServiceRef};
use std::time::Duration;

pub async fn check<Q: TaskQueries + ?Sized>(
    client: &Q,
    cluster: ClusterRef,
    service: ServiceRef,
    output: &Output,
) -> Result<()> {
    let snapshot = client.describe_service(&cluster, &service).await?;
    output.progress(&format!(
        "{service}: desired {}, running {}, pending {}",
        snapshot.desired_count, snapshot.running_count, snapshot.pending_count
    ));

    let monitor = RolloutMonitor::new(
        client,
        cluster,
        snapshot.to_service_ref(),
        snapshot.task_spec.clone(),
    );
    let outcome = monitor.sample().await?;

    settle(outcome, monitor.service(), Duration::ZERO, output)
}
