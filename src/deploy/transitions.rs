// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::orchestrator::{ServiceControl, SpecRegistry, TaskQueries};
use crate::types::{ClusterRef, RegisteredTaskSpec, ServiceRef, ServiceSnapshot, TaskSpecification};
use crate::versioning::{current_tag, rewrite_image};

use super::Deployment;
use super::error::DeployError;
use super::monitor::RolloutMonitor;
use super::state::{Initialized, Registered, Retargeted, Versioned};

impl<S> Deployment<S> {
    /// Internal helper to move to the next state.
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            cluster: self.cluster,
            service: self.service,
            tag: self.tag,
            previous: self.previous,
            snapshot: self.snapshot,
            state,
        }
    }
}

// =============================================================================
// -> Initialized
// =============================================================================

impl Deployment<Initialized> {
    /// Read the service and the task specification it currently runs.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Query` if either read fails.
    pub async fn prepare<O>(
        client: &O,
        cluster: ClusterRef,
        service: &ServiceRef,
        tag: impl Into<String>,
    ) -> Result<Self, DeployError>
    where
        O: TaskQueries + SpecRegistry + ?Sized,
    {
        let snapshot = client.describe_service(&cluster, service).await?;
        let previous = client.describe_task_spec(&snapshot.task_spec).await?;
        let deployed =
            current_tag(&previous.spec).unwrap_or_else(|_| "<unparseable>".to_string());

        tracing::info!(
            cluster = %cluster,
            service = %service,
            spec = %previous.id.short_name(),
            deployed = %deployed,
            "current deployment"
        );

        Ok(Self::new(cluster, snapshot, previous, tag))
    }

    /// Build the new task specification. Pure; touches no remote state.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Version` if the primary image or the tag is malformed.
    #[must_use = "deployment state must be used"]
    pub fn version(self) -> Result<Deployment<Versioned>, DeployError> {
        let spec = rewrite_image(&self.previous.spec, &self.tag)?;
        Ok(self.transition(Versioned { spec }))
    }
}

// =============================================================================
// Versioned -> Registered
// =============================================================================

impl Deployment<Versioned> {
    /// The specification that will be registered.
    pub fn spec(&self) -> &TaskSpecification {
        &self.state.spec
    }

    /// Register the new specification as a new revision.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Query` if registration fails. The service is untouched.
    #[must_use = "deployment state must be used"]
    pub async fn register<R: SpecRegistry + ?Sized>(
        self,
        registry: &R,
    ) -> Result<Deployment<Registered>, DeployError> {
        let registered = registry.register_task_spec(&self.state.spec).await?;

        tracing::info!(
            family = %registered.spec.family,
            revision = registered.revision,
            spec = %registered.id,
            "registered task specification"
        );

        Ok(self.transition(Registered { registered }))
    }
}

// =============================================================================
// Registered -> Retargeted
// =============================================================================

impl Deployment<Registered> {
    pub fn registered(&self) -> &RegisteredTaskSpec {
        &self.state.registered
    }

    /// Point the service at the registered specification.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Query` if the update fails, or
    /// `DeployError::NotRetargeted` if the service reports a different target.
    #[must_use = "deployment state must be used"]
    pub async fn retarget<C: ServiceControl + ?Sized>(
        self,
        control: &C,
    ) -> Result<Deployment<Retargeted>, DeployError> {
        let registered = self.state.registered.clone();
        let service = control
            .update_service(&self.cluster, &self.service, &registered.id)
            .await?;

        if service.task_spec != registered.id {
            return Err(DeployError::NotRetargeted {
                service: service.name,
                expected: registered.id,
                found: service.task_spec,
            });
        }

        tracing::info!(
            cluster = %self.cluster,
            service = %self.service,
            spec = %registered.id.short_name(),
            desired = service.desired_count,
            "service retargeted"
        );

        Ok(self.transition(Retargeted {
            registered,
            service,
        }))
    }
}

// =============================================================================
// Retargeted - Terminal State
// =============================================================================

impl Deployment<Retargeted> {
    pub fn registered(&self) -> &RegisteredTaskSpec {
        &self.state.registered
    }

    /// Service state returned by the update.
    pub fn service_snapshot(&self) -> &ServiceSnapshot {
        &self.state.service
    }

    /// A monitor for the rollout onto the new specification.
    pub fn monitor<'a, Q: TaskQueries + ?Sized>(&self, client: &'a Q) -> RolloutMonitor<'a, Q> {
        RolloutMonitor::new(
            client,
            self.cluster.clone(),
            self.state.service.to_service_ref(),
            self.state.registered.id.clone(),
        )
    }

    /// Consume the deployment and return the registered specification.
    pub fn finish(self) -> RegisteredTaskSpec {
        self.state.registered
    }
}
