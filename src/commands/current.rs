// ABOUTME: Current command implementation.
// ABOUTME: Prints the image tag a service's task specification runs.

use sortie::error::Result;
use sortie::orchestrator::{SpecRegistry, TaskQueries};
use sortie::output::Output;
use sortie::types::{ClusterRef, ServiceRef};
use sortie::versioning::current_tag;

pub async fn current<O: TaskQueries + SpecRegistry + ?Sized>(
    client: &O,
    cluster: ClusterRef,
    service: ServiceRef,
    output: &Output,
) -> Result<()> {
    let snapshot = client.describe_service(&cluster, &service).await?;
    let spec = client.describe_task_spec(&snapshot.task_spec).await?;
    let tag = current_tag(&spec.spec)?;

    output.progress(&format!(
        "{service} runs {} ({})",
        spec.spec.primary().image,
        spec.id.short_name()
    ));
    output.success(&tag);
    Ok(())
}
