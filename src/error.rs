// ABOUTME: Application-wide error types for sortie.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::deploy::DeployError;
use crate::orchestrator::{QueryError, SigningError, TransportError};
use crate::types::ParseImageRefError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "no orchestrator endpoint configured (use --endpoint, SORTIE_ENDPOINT, `endpoint:` in sortie.yml, or set a region)"
    )]
    MissingEndpoint,

    #[error("no {0} given (use --{0} or set `{0}:` in sortie.yml)")]
    MissingTarget(&'static str),

    #[error("command is empty: {0:?}")]
    EmptyCommand(String),

    #[error("orchestrator client: {0}")]
    Transport(#[from] TransportError),

    #[error("request signing: {0}")]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Version(#[from] ParseImageRefError),

    #[error("rollout of {service} failed: {reason}")]
    RolloutFailed { service: String, reason: String },

    #[error("rollout of {service} did not converge within {timeout:?}")]
    RolloutTimedOut { service: String, timeout: Duration },

    #[error("rollout of {0} aborted")]
    RolloutAborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
