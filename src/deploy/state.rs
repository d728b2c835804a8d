// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries the data that exists once it has been reached.

use crate::types::{RegisteredTaskSpec, ServiceSnapshot, TaskSpecification};

/// Initial state: service and its current task specification have been read.
/// Available actions: `version()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Versioned: a new task specification exists locally, nothing has been
/// sent to the orchestrator.
/// Available actions: `register()`
#[derive(Debug, Clone)]
pub struct Versioned {
    pub(crate) spec: TaskSpecification,
}

/// Registered: the new specification has an orchestrator identity.
/// Available actions: `retarget()`
#[derive(Debug, Clone)]
pub struct Registered {
    pub(crate) registered: RegisteredTaskSpec,
}

/// Retargeted: the service now points at the new specification.
/// Available actions: `monitor()`
#[derive(Debug, Clone)]
pub struct Retargeted {
    pub(crate) registered: RegisteredTaskSpec,
    pub(crate) service: ServiceSnapshot,
}
