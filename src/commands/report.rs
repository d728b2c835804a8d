// ABOUTME: Maps rollout outcomes to CLI output and exit status.
// ABOUTME: Shared by the deploy and check commands.

use sortie::deploy::DeploymentOutcome;
use sortie::error::{Error, Result};
use sortie::output::Output;
use sortie::types::ServiceRef;
use std::time::Duration;

/// Print `outcome` and turn the failing ones into errors.
///
/// `timeout` is only used to describe a `TimedOut` outcome.
pub fn settle(
    outcome: DeploymentOutcome,
    service: &ServiceRef,
    timeout: Duration,
    output: &Output,
) -> Result<()> {
    match &outcome {
        DeploymentOutcome::Running(spec) => {
            output.outcome(
                &outcome,
                &format!("  ✓ {service} is running {}", spec.short_name()),
            );
            Ok(())
        }
        DeploymentOutcome::NoDesiredCapacity => {
            output.warning(&format!(
                "{service} has no desired capacity, nothing will run"
            ));
            output.outcome(&outcome, &format!("  ✓ {service} updated (scaled to zero)"));
            Ok(())
        }
        DeploymentOutcome::NotYetRunning => {
            output.outcome(
                &outcome,
                &format!("  … {service} has no running task on its target yet"),
            );
            Ok(())
        }
        DeploymentOutcome::Failed(reason) => Err(Error::RolloutFailed {
            service: service.to_string(),
            reason: reason.clone(),
        }),
        DeploymentOutcome::TimedOut => Err(Error::RolloutTimedOut {
            service: service.to_string(),
            timeout,
        }),
        DeploymentOutcome::Aborted => Err(Error::RolloutAborted(service.to_string())),
    }
}
