// ABOUTME: Error types for deployment operations.
// ABOUTME: Wraps versioning and orchestrator failures with their causes and a kind tag.

use crate::orchestrator::{QueryError, QueryErrorKind};
use crate::types::{ParseImageRefError, TaskSpecId};

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The current specification's primary image or the requested tag is
    /// malformed. Raised before anything is registered.
    #[error("cannot version task specification: {0}")]
    Version(#[from] ParseImageRefError),

    /// An orchestrator call failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The orchestrator accepted the update but the service targets something else.
    #[error("service {service} was not retargeted: expected {expected}, found {found}")]
    NotRetargeted {
        service: String,
        expected: TaskSpecId,
        found: TaskSpecId,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Malformed image or tag; never retriable.
    Version,
    /// Orchestrator failure of the given kind.
    Query(QueryErrorKind),
    /// The service update did not take effect.
    NotRetargeted,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Version(_) => DeployErrorKind::Version,
            DeployError::Query(e) => DeployErrorKind::Query(e.kind()),
            DeployError::NotRetargeted { .. } => DeployErrorKind::NotRetargeted,
        }
    }
}
