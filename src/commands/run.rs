// ABOUTME: Run command implementation.
// ABOUTME: Starts a one-off task from the service's current specification.

use sortie::error::Result;
use sortie::orchestrator::Orchestrator;
use sortie::output::Output;
use sortie::types::{ClusterRef, ServiceRef};

pub async fn run_task<O: Orchestrator + ?Sized>(
    client: &O,
    cluster: ClusterRef,
    service: ServiceRef,
    command: &[String],
    output: &Output,
) -> Result<()> {
    let snapshot = client.describe_service(&cluster, &service).await?;
    let spec = client.describe_task_spec(&snapshot.task_spec).await?;

    output.progress(&format!(
        "Running `{}` in {} from {}",
        command.join(" "),
        spec.spec.primary().name,
        spec.id.short_name()
    ));

    let tasks = client.run_task(&cluster, &spec, command).await?;
    for task in &tasks {
        output.success(&task.id.to_string());
    }
    Ok(())
}
