// ABOUTME: Rollout outcomes and the monitor's state machine states.
// ABOUTME: Terminal states are sticky; each maps to exactly one outcome.

use serde::Serialize;
use std::fmt;

use crate::types::TaskSpecId;

/// Result of one convergence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DeploymentOutcome {
    /// At least one task on the target specification is running.
    Running(TaskSpecId),
    /// Keep sampling.
    NotYetRunning,
    /// Desired count is zero or less, so there is nothing to wait for.
    NoDesiredCapacity,
    /// The rollout cannot converge (for example the service was retargeted).
    Failed(String),
    /// The caller's deadline passed first.
    TimedOut,
    /// The caller stopped waiting.
    Aborted,
}

impl DeploymentOutcome {
    /// Whether further sampling can change the answer.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentOutcome::NotYetRunning)
    }

    /// Terminal outcomes that count as a successful deployment.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DeploymentOutcome::Running(_) | DeploymentOutcome::NoDesiredCapacity
        )
    }
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentOutcome::Running(spec) => write!(f, "running {}", spec.short_name()),
            DeploymentOutcome::NotYetRunning => f.write_str("not yet running"),
            DeploymentOutcome::NoDesiredCapacity => f.write_str("no desired capacity"),
            DeploymentOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            DeploymentOutcome::TimedOut => f.write_str("timed out"),
            DeploymentOutcome::Aborted => f.write_str("aborted"),
        }
    }
}

/// Consecutive `Failed` samples needed before a rollout counts as diverged.
pub const DIVERGENCE_CONFIRMATIONS: u32 = 3;

/// Where a monitored rollout currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutState {
    /// No sample has completed yet.
    Start,
    /// Sampled at least once without converging. `divergent` counts the
    /// trailing samples that saw the service point elsewhere.
    Sampling { samples: u32, divergent: u32 },
    /// Converged as `Running` or `NoDesiredCapacity`.
    Converged(DeploymentOutcome),
    /// Can no longer converge on the target.
    Diverged(String),
    TimedOut,
    Aborted,
}

impl RolloutState {
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// The outcome a terminal state keeps reporting.
    pub fn outcome(&self) -> Option<DeploymentOutcome> {
        match self {
            RolloutState::Start | RolloutState::Sampling { .. } => None,
            RolloutState::Converged(outcome) => Some(outcome.clone()),
            RolloutState::Diverged(reason) => Some(DeploymentOutcome::Failed(reason.clone())),
            RolloutState::TimedOut => Some(DeploymentOutcome::TimedOut),
            RolloutState::Aborted => Some(DeploymentOutcome::Aborted),
        }
    }

    /// The state after observing `outcome` from this one.
    pub(crate) fn after(&self, outcome: &DeploymentOutcome) -> RolloutState {
        let (samples, divergent) = match self {
            RolloutState::Sampling { samples, divergent } => (*samples, *divergent),
            _ => (0, 0),
        };
        match outcome {
            DeploymentOutcome::NotYetRunning => RolloutState::Sampling {
                samples: samples + 1,
                divergent: 0,
            },
            DeploymentOutcome::Running(_) | DeploymentOutcome::NoDesiredCapacity => {
                RolloutState::Converged(outcome.clone())
            }
            DeploymentOutcome::Failed(_) if divergent + 1 < DIVERGENCE_CONFIRMATIONS => {
                RolloutState::Sampling {
                    samples: samples + 1,
                    divergent: divergent + 1,
                }
            }
            DeploymentOutcome::Failed(reason) => RolloutState::Diverged(reason.clone()),
            DeploymentOutcome::TimedOut => RolloutState::TimedOut,
            DeploymentOutcome::Aborted => RolloutState::Aborted,
        }
    }
}
