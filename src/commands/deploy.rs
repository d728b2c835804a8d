// ABOUTME: Deploy command implementation.
// ABOUTME: Drives the deployment state machine and waits for the rollout.

use super::report::settle;
use sortie::deploy::{Deployment, PollPolicy, watch};
use sortie::error::Result;
use sortie::orchestrator::Orchestrator;
use sortie::output::Output;
use sortie::types::{ClusterRef, ServiceRef};

/// Deploy `tag` to `service`. With no policy, returns once the service is
/// updated instead of waiting for the rollout.
pub async fn deploy<O: Orchestrator + ?Sized>(
    client: &O,
    cluster: ClusterRef,
    service: ServiceRef,
    tag: &str,
    policy: Option<PollPolicy>,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Deploying {tag} to {service} in {cluster}"));

    let deployment = Deployment::prepare(client, cluster, &service, tag).await?;
    output.progress(&format!(
        "  → Current image: {}",
        deployment.previous().spec.primary().image
    ));

    let deployment = deployment.version()?;
    output.progress(&format!("  → New image: {}", deployment.spec().primary().image));

    let deployment = deployment.register(client).await?;
    output.progress(&format!(
        "  → Registered {}",
        deployment.registered().id.short_name()
    ));

    let deployment = deployment.retarget(client).await?;
    output.progress("  → Service updated");

    let Some(policy) = policy else {
        output.success(&format!(
            "  ✓ {} now targets {}",
            deployment.service(),
            deployment.registered().id.short_name()
        ));
        return Ok(());
    };

    output.progress(&format!(
        "  → Waiting for a running task (timeout {}s)...",
        policy.timeout.as_secs()
    ));

    let monitor = deployment.monitor(client);
    let outcome = watch(&monitor, &policy, interrupted()).await?;

    settle(outcome, deployment.service(), policy.timeout, &output)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
