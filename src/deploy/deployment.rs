// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::types::{ClusterRef, RegisteredTaskSpec, ServiceRef, ServiceSnapshot};

use super::state::Initialized;

/// A deployment of a new image tag to one service, parameterized by its
/// current state.
///
/// Mutating steps only exist on the states that allow them, so a service
/// cannot be retargeted before a specification has been registered:
///
/// ```compile_fail
/// use sortie::deploy::{Deployment, Initialized};
/// use sortie::orchestrator::EcsClient;
///
/// async fn skip_ahead(deployment: Deployment<Initialized>, client: &EcsClient) {
///     let _ = deployment.retarget(client).await;
/// }
/// ```
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) cluster: ClusterRef,
    pub(crate) service: ServiceRef,
    pub(crate) tag: String,
    pub(crate) previous: RegisteredTaskSpec,
    pub(crate) snapshot: ServiceSnapshot,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    /// Start a deployment from already-fetched service state.
    pub fn new(
        cluster: ClusterRef,
        snapshot: ServiceSnapshot,
        previous: RegisteredTaskSpec,
        tag: impl Into<String>,
    ) -> Self {
        Deployment {
            cluster,
            service: snapshot.to_service_ref(),
            tag: tag.into(),
            previous,
            snapshot,
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn cluster(&self) -> &ClusterRef {
        &self.cluster
    }

    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    /// The image tag being deployed.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The specification the service ran before this deployment.
    pub fn previous(&self) -> &RegisteredTaskSpec {
        &self.previous
    }

    /// Service state as read when the deployment was prepared.
    pub fn initial_snapshot(&self) -> &ServiceSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}
