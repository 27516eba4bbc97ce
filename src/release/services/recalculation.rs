//! Derives release statuses from the task statuses beneath them.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;

use super::ReleaseLocks;
use crate::{
    audit::{
        AuditTrail,
        domain::{AuditAction, AuditRecordType},
        ports::AuditSink,
    },
    environment::domain::EnvironmentId,
    release::{
        domain::{
            DeploymentTaskStatus, ReleaseId, ReleaseStatusId, StatusTransition, rollup,
        },
        ports::{ReleaseRepository, ReleaseRepositoryError, StatusRepository, StatusRepositoryError},
    },
    scope::{MissingTenantScope, RequestContext},
};

/// One release status row changed by a recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseStatusChange {
    /// Changed row.
    pub status_id: ReleaseStatusId,
    /// Environment the row tracks.
    pub environment_id: EnvironmentId,
    /// Stored value before and after.
    pub transition: StatusTransition,
}

/// Errors raised by a recalculation.
#[derive(Debug, Error)]
pub enum RecalculationError {
    /// The request carries no tenant.
    #[error(transparent)]
    MissingScope(#[from] MissingTenantScope),
    /// The release does not exist for the tenant.
    #[error("release not found: {0}")]
    ReleaseNotFound(ReleaseId),
    /// Release or task lookup failed.
    #[error(transparent)]
    Release(#[from] ReleaseRepositoryError),
    /// Status rows could not be read or written.
    #[error(transparent)]
    Status(#[from] StatusRepositoryError),
}

/// Result type for recalculations.
pub type RecalculationResult<T> = Result<T, RecalculationError>;

/// Re-reads a release's task statuses and persists rollup changes.
///
/// Every run reads the status store afresh and writes only rows whose value
/// changes, so repeated runs without task status changes are no-ops.
#[derive(Clone)]
pub struct RecalculationOrchestrator<R, S, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    releases: Arc<R>,
    statuses: Arc<S>,
    audit: AuditTrail<A, C>,
    clock: Arc<C>,
    locks: ReleaseLocks,
}

impl<R, S, A, C> RecalculationOrchestrator<R, S, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator serialising on `locks`.
    #[must_use]
    pub const fn new(
        releases: Arc<R>,
        statuses: Arc<S>,
        audit: AuditTrail<A, C>,
        clock: Arc<C>,
        locks: ReleaseLocks,
    ) -> Self {
        Self {
            releases,
            statuses,
            audit,
            clock,
            locks,
        }
    }

    /// Returns the lock table shared with callers that write task statuses.
    #[must_use]
    pub const fn locks(&self) -> &ReleaseLocks {
        &self.locks
    }

    /// Recalculates every status row of `release_id` under the release lock.
    ///
    /// # Errors
    ///
    /// Returns [`RecalculationError::MissingScope`] before any storage access
    /// when the request has no tenant, [`RecalculationError::ReleaseNotFound`]
    /// when the tenant owns no such release, and repository errors otherwise.
    #[tracing::instrument(skip_all, fields(release_id = %release_id))]
    pub async fn recalculate(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> RecalculationResult<Vec<ReleaseStatusChange>> {
        context.require_tenant()?;
        let _guard = self.locks.acquire(release_id).await;
        self.recalculate_held(context, release_id).await
    }

    /// Recalculates without taking the release lock. The caller must hold
    /// the lock for `release_id`.
    pub(crate) async fn recalculate_held(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> RecalculationResult<Vec<ReleaseStatusChange>> {
        let tenant_id = context.require_tenant()?;
        let release = self
            .releases
            .find_release(release_id)
            .await?
            .filter(|release| release.tenant_id() == tenant_id)
            .ok_or(RecalculationError::ReleaseNotFound(release_id))?;

        let by_environment = self.task_statuses_by_environment(release.id()).await?;
        let rows = self
            .statuses
            .find_release_statuses_by_release(release.id())
            .await?;

        let mut changes = Vec::new();
        for row in rows {
            let current = row.status();
            let computed = rollup(
                current,
                by_environment
                    .get(&row.environment_id())
                    .into_iter()
                    .flatten()
                    .copied(),
            );
            if computed == current {
                continue;
            }

            let affected = self
                .statuses
                .update_release_status(row.id(), computed, self.clock.utc())
                .await?;
            if affected == 0 {
                tracing::warn!(
                    status_id = %row.id(),
                    "release status row disappeared during recalculation"
                );
                continue;
            }

            let transition = StatusTransition {
                from: current,
                to: computed,
            };
            tracing::info!(
                status_id = %row.id(),
                environment_id = %row.environment_id(),
                from = %current,
                to = %computed,
                "release status recalculated"
            );
            self.audit
                .record(
                    context,
                    row.id().into_inner(),
                    AuditRecordType::ReleaseStatus,
                    AuditAction::Updated,
                    transition.to_details(),
                )
                .await;
            changes.push(ReleaseStatusChange {
                status_id: row.id(),
                environment_id: row.environment_id(),
                transition,
            });
        }

        if changes.is_empty() {
            tracing::debug!("release statuses already consistent");
        }
        Ok(changes)
    }

    async fn task_statuses_by_environment(
        &self,
        release_id: ReleaseId,
    ) -> RecalculationResult<HashMap<EnvironmentId, Vec<DeploymentTaskStatus>>> {
        let mut by_environment: HashMap<EnvironmentId, Vec<DeploymentTaskStatus>> =
            HashMap::new();
        for task in self.releases.tasks_for_release(release_id).await? {
            for row in self.statuses.find_task_statuses_by_task(task.id()).await? {
                by_environment
                    .entry(row.environment_id())
                    .or_default()
                    .push(row.status());
            }
        }
        Ok(by_environment)
    }
}
