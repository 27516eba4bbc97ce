//! Creation, renaming, soft deletion and hard deletion of environments.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use thiserror::Error;

use crate::{
    audit::{
        AuditTrail,
        domain::{AuditAction, AuditRecordType},
        ports::AuditSink,
    },
    environment::{
        domain::{DeploymentEnvironment, EnvironmentDomainError, EnvironmentId, EnvironmentName},
        ports::{EnvironmentRepository, EnvironmentRepositoryError},
    },
    release::{
        ports::{ReleaseRepository, StatusRepository},
        services::{MatrixMaintainer, MatrixMaintenanceError},
    },
    scope::{MissingTenantScope, RequestContext, TenantId},
};

/// Service-level errors for environment lifecycle operations.
#[derive(Debug, Error)]
pub enum EnvironmentLifecycleError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] EnvironmentDomainError),
    /// The request carries no tenant.
    #[error(transparent)]
    MissingScope(#[from] MissingTenantScope),
    /// The environment does not exist for the tenant.
    #[error("environment not found: {0}")]
    NotFound(EnvironmentId),
    /// Environment persistence failed.
    #[error(transparent)]
    Repository(#[from] EnvironmentRepositoryError),
    /// The status matrix could not be maintained.
    #[error(transparent)]
    Matrix(#[from] MatrixMaintenanceError),
}

/// Result type for environment lifecycle operations.
pub type EnvironmentLifecycleResult<T> = Result<T, EnvironmentLifecycleError>;

/// Environment lifecycle orchestration service.
#[derive(Clone)]
pub struct EnvironmentLifecycleService<R, S, E, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    environments: Arc<E>,
    matrix: MatrixMaintainer<R, S, E, C>,
    audit: AuditTrail<A, C>,
    clock: Arc<C>,
}

impl<R, S, E, A, C> EnvironmentLifecycleService<R, S, E, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    /// Creates a new environment lifecycle service.
    #[must_use]
    pub fn new(
        releases: Arc<R>,
        statuses: Arc<S>,
        environments: Arc<E>,
        audit_sink: Arc<A>,
        clock: Arc<C>,
    ) -> Self {
        let matrix = MatrixMaintainer::new(
            releases,
            statuses,
            Arc::clone(&environments),
            Arc::clone(&clock),
        );
        Self {
            environments,
            matrix,
            audit: AuditTrail::new(audit_sink, Arc::clone(&clock)),
            clock,
        }
    }

    /// Creates an environment and backfills `NOT_REQUIRED` statuses for every
    /// existing release and task of the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::Domain`] for a blank name and
    /// persistence errors otherwise.
    pub async fn create(
        &self,
        context: &RequestContext,
        name: &str,
    ) -> EnvironmentLifecycleResult<DeploymentEnvironment> {
        let tenant_id = context.require_tenant()?;
        let environment_name = EnvironmentName::new(name)?;
        let environment = DeploymentEnvironment::new(tenant_id, environment_name, &*self.clock);
        self.environments.store(&environment).await?;
        self.audit
            .record(
                context,
                environment.id().into_inner(),
                AuditRecordType::DeploymentEnvironment,
                AuditAction::Created,
                json!({ "name": environment.name().as_str() }),
            )
            .await;
        tracing::info!(
            environment_id = %environment.id(),
            tenant_id = %tenant_id,
            name = %environment.name(),
            "environment created"
        );

        self.matrix.backfill_environment(&environment).await?;
        Ok(environment)
    }

    /// Renames an environment.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::NotFound`] when the tenant owns
    /// no such environment.
    pub async fn rename(
        &self,
        context: &RequestContext,
        id: EnvironmentId,
        name: &str,
    ) -> EnvironmentLifecycleResult<DeploymentEnvironment> {
        let tenant_id = context.require_tenant()?;
        let new_name = EnvironmentName::new(name)?;
        let mut environment = self.owned(tenant_id, id).await?;
        if environment.name() == &new_name {
            return Ok(environment);
        }

        let previous = environment.name().as_str().to_owned();
        environment.rename(new_name, &*self.clock);
        self.environments.update(&environment).await?;
        self.audit
            .record(
                context,
                id.into_inner(),
                AuditRecordType::DeploymentEnvironment,
                AuditAction::Updated,
                json!({ "from": previous, "to": environment.name().as_str() }),
            )
            .await;
        Ok(environment)
    }

    /// Soft-deletes an environment. Its status rows are kept, and it no
    /// longer receives rows for new releases and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::NotFound`] when the tenant owns
    /// no such environment.
    pub async fn deactivate(
        &self,
        context: &RequestContext,
        id: EnvironmentId,
    ) -> EnvironmentLifecycleResult<DeploymentEnvironment> {
        let tenant_id = context.require_tenant()?;
        let mut environment = self.owned(tenant_id, id).await?;
        if environment.deactivate(&*self.clock) {
            self.environments.update(&environment).await?;
            self.record_activity(context, &environment).await;
            tracing::info!(environment_id = %id, "environment deactivated");
        }
        Ok(environment)
    }

    /// Reactivates a soft-deleted environment and adds `NOT_REQUIRED` rows
    /// for releases and tasks created while it was inactive.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::NotFound`] when the tenant owns
    /// no such environment.
    pub async fn reactivate(
        &self,
        context: &RequestContext,
        id: EnvironmentId,
    ) -> EnvironmentLifecycleResult<DeploymentEnvironment> {
        let tenant_id = context.require_tenant()?;
        let mut environment = self.owned(tenant_id, id).await?;
        if environment.reactivate(&*self.clock) {
            self.environments.update(&environment).await?;
            self.record_activity(context, &environment).await;
            tracing::info!(environment_id = %id, "environment reactivated");
            self.matrix.fill_environment_gaps(&environment).await?;
        }
        Ok(environment)
    }

    /// Removes an environment and every status row referencing it.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::NotFound`] when the tenant owns
    /// no such environment.
    pub async fn hard_delete(
        &self,
        context: &RequestContext,
        id: EnvironmentId,
    ) -> EnvironmentLifecycleResult<()> {
        let tenant_id = context.require_tenant()?;
        let environment = self.owned(tenant_id, id).await?;
        self.matrix.purge_environment(id).await?;
        if !self.environments.hard_delete(id).await? {
            return Err(EnvironmentLifecycleError::NotFound(id));
        }
        self.audit
            .record(
                context,
                id.into_inner(),
                AuditRecordType::DeploymentEnvironment,
                AuditAction::Deleted,
                json!({ "name": environment.name().as_str() }),
            )
            .await;
        tracing::info!(environment_id = %id, "environment deleted");
        Ok(())
    }

    /// Lists the tenant's active environments by name.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentLifecycleError::MissingScope`] when the request
    /// has no tenant.
    pub async fn list(
        &self,
        context: &RequestContext,
    ) -> EnvironmentLifecycleResult<Vec<DeploymentEnvironment>> {
        let tenant_id = context.require_tenant()?;
        Ok(self.environments.active_for_tenant(tenant_id).await?)
    }

    async fn owned(
        &self,
        tenant_id: TenantId,
        id: EnvironmentId,
    ) -> EnvironmentLifecycleResult<DeploymentEnvironment> {
        self.environments
            .find_by_id(id)
            .await?
            .filter(|environment| environment.tenant_id() == tenant_id)
            .ok_or(EnvironmentLifecycleError::NotFound(id))
    }

    async fn record_activity(&self, context: &RequestContext, environment: &DeploymentEnvironment) {
        self.audit
            .record(
                context,
                environment.id().into_inner(),
                AuditRecordType::DeploymentEnvironment,
                AuditAction::Updated,
                json!({ "active": environment.is_active() }),
            )
            .await;
    }
}
