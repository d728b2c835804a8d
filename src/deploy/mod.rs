// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports the deployment driver, rollout monitor, and polling loop.

mod deployment;
mod error;
mod monitor;
mod outcome;
mod state;
mod transitions;
mod watch;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind};
pub use monitor::{RolloutMonitor, sample};
pub use outcome::{DIVERGENCE_CONFIRMATIONS, DeploymentOutcome, RolloutState};
pub use state::{Initialized, Registered, Retargeted, Versioned};
pub use watch::{PollPolicy, watch};
