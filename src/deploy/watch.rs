// ABOUTME: Caller-side polling loop around RolloutMonitor.
// ABOUTME: Owns the poll interval, overall deadline, cancellation, and query retry budget.

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use super::monitor::RolloutMonitor;
use super::outcome::DeploymentOutcome;
use crate::orchestrator::{QueryError, TaskQueries};

/// How long and how often to sample a rollout.
#[derive(Debug, Clone, Deserialize)]
pub struct PollPolicy {
    /// Delay between samples.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Give up and report `TimedOut` after this long.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Consecutive query failures tolerated before the last one is returned.
    #[serde(default = "default_max_query_failures")]
    pub max_query_failures: u32,
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_max_query_failures() -> u32 {
    3
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            max_query_failures: default_max_query_failures(),
        }
    }
}

/// Sample `monitor` every `policy.interval` until it reaches a terminal outcome.
///
/// Returns `TimedOut` once `policy.timeout` has elapsed (an in-flight sample
/// is dropped) and `Aborted` as soon as `abort` resolves. Retriable query
/// errors are retried on the next tick; after more than
/// `policy.max_query_failures` in a row the last error is returned. Any other
/// query error is returned at once.
pub async fn watch<Q, F>(
    monitor: &RolloutMonitor<'_, Q>,
    policy: &PollPolicy,
    abort: F,
) -> Result<DeploymentOutcome, QueryError>
where
    Q: TaskQueries + ?Sized,
    F: Future<Output = ()>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut failures = 0u32;
    tokio::pin!(abort);

    loop {
        let sampled = tokio::select! {
            _ = &mut abort => return Ok(monitor.abort()),
            result = tokio::time::timeout_at(deadline, monitor.sample()) => result,
        };

        match sampled {
            Err(_elapsed) => return Ok(monitor.time_out()),
            Ok(Ok(outcome)) if outcome.is_terminal() => return Ok(outcome),
            Ok(Ok(_)) => failures = 0,
            Ok(Err(e)) if !e.is_retriable() => return Err(e),
            Ok(Err(e)) => {
                failures += 1;
                if failures > policy.max_query_failures {
                    return Err(e);
                }
                tracing::warn!(
                    service = %monitor.service(),
                    attempt = failures,
                    "rollout sample failed, retrying: {}",
                    e
                );
            }
        }

        tokio::select! {
            _ = &mut abort => return Ok(monitor.abort()),
            _ = tokio::time::sleep_until(deadline) => return Ok(monitor.time_out()),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}
