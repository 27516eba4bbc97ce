//! Keeps the status matrix free of gaps.
//!
//! Every (release, active environment) and (task, active environment) pair
//! owns exactly one status row. New releases and tasks start `PENDING` in
//! every active environment. New environments start `NOT_REQUIRED` for every
//! existing release and task, so they never block releases that predate them.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;

use crate::{
    environment::{
        domain::{DeploymentEnvironment, EnvironmentId},
        ports::{EnvironmentRepository, EnvironmentRepositoryError},
    },
    release::{
        domain::{
            DeploymentTaskStatus, Release, ReleaseId, ReleaseStatus, Task, TaskId, TaskStatus,
        },
        ports::{ReleaseRepository, ReleaseRepositoryError, StatusRepository, StatusRepositoryError},
    },
    scope::TenantId,
};

/// Errors raised while maintaining the status matrix.
#[derive(Debug, Error)]
pub enum MatrixMaintenanceError {
    /// Release or task lookup failed.
    #[error(transparent)]
    Release(#[from] ReleaseRepositoryError),
    /// Status rows could not be read or written.
    #[error(transparent)]
    Status(#[from] StatusRepositoryError),
    /// Active environments could not be listed.
    #[error(transparent)]
    Environment(#[from] EnvironmentRepositoryError),
}

/// Result type for matrix maintenance.
pub type MatrixMaintenanceResult<T> = Result<T, MatrixMaintenanceError>;

/// Creates and removes status rows as releases, tasks and environments come
/// and go.
#[derive(Clone)]
pub struct MatrixMaintainer<R, S, E, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    C: Clock + Send + Sync,
{
    releases: Arc<R>,
    statuses: Arc<S>,
    environments: Arc<E>,
    clock: Arc<C>,
}

impl<R, S, E, C> MatrixMaintainer<R, S, E, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a matrix maintainer.
    #[must_use]
    pub const fn new(
        releases: Arc<R>,
        statuses: Arc<S>,
        environments: Arc<E>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            releases,
            statuses,
            environments,
            clock,
        }
    }

    /// Inserts a `PENDING` row for a new release in every active environment
    /// of its tenant.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError`] when environments cannot be listed
    /// or the rows cannot be inserted.
    pub async fn backfill_release(
        &self,
        release: &Release,
    ) -> MatrixMaintenanceResult<Vec<ReleaseStatus>> {
        let environments = self.active_environment_ids(release.tenant_id()).await?;
        let rows: Vec<ReleaseStatus> = environments
            .into_iter()
            .map(|environment_id| {
                ReleaseStatus::new(
                    release.id(),
                    environment_id,
                    DeploymentTaskStatus::Pending,
                    &*self.clock,
                )
            })
            .collect();
        self.statuses
            .insert_release_statuses(&rows)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = %err,
                    release_id = %release.id(),
                    "release status backfill failed"
                );
            })?;
        tracing::info!(
            release_id = %release.id(),
            rows = rows.len(),
            "backfilled release statuses"
        );
        Ok(rows)
    }

    /// Inserts a `PENDING` row for a new task in every active environment of
    /// the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError`] when environments cannot be listed
    /// or the rows cannot be inserted.
    pub async fn backfill_task(
        &self,
        tenant_id: TenantId,
        task: &Task,
    ) -> MatrixMaintenanceResult<Vec<TaskStatus>> {
        let environments = self.active_environment_ids(tenant_id).await?;
        let rows: Vec<TaskStatus> = environments
            .into_iter()
            .map(|environment_id| {
                TaskStatus::new(
                    task.id(),
                    environment_id,
                    DeploymentTaskStatus::Pending,
                    &*self.clock,
                )
            })
            .collect();
        self.statuses
            .insert_task_statuses(&rows)
            .await
            .inspect_err(|err| {
                tracing::error!(error = %err, task_id = %task.id(), "task status backfill failed");
            })?;
        tracing::info!(task_id = %task.id(), rows = rows.len(), "backfilled task statuses");
        Ok(rows)
    }

    /// Inserts a `NOT_REQUIRED` row for every release and task of the
    /// environment's tenant. No recalculation follows.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError`] when lookups or inserts fail.
    pub async fn backfill_environment(
        &self,
        environment: &DeploymentEnvironment,
    ) -> MatrixMaintenanceResult<()> {
        let tenant_id = environment.tenant_id();
        let release_ids = self.releases.release_ids_for_tenant(tenant_id).await?;
        let task_ids = self.releases.task_ids_for_tenant(tenant_id).await?;
        self.insert_not_required(environment.id(), release_ids, task_ids)
            .await
    }

    /// Inserts `NOT_REQUIRED` rows for the releases and tasks that have no
    /// row for the environment yet, leaving existing rows untouched.
    ///
    /// Used when a soft-deleted environment comes back.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError`] when lookups or inserts fail.
    pub async fn fill_environment_gaps(
        &self,
        environment: &DeploymentEnvironment,
    ) -> MatrixMaintenanceResult<()> {
        let tenant_id = environment.tenant_id();
        let environment_id = environment.id();

        let covered_releases: HashSet<ReleaseId> = self
            .statuses
            .release_ids_covering(environment_id)
            .await?
            .into_iter()
            .collect();
        let covered_tasks: HashSet<_> = self
            .statuses
            .task_ids_covering(environment_id)
            .await?
            .into_iter()
            .collect();

        let release_ids = self
            .releases
            .release_ids_for_tenant(tenant_id)
            .await?
            .into_iter()
            .filter(|id| !covered_releases.contains(id))
            .collect();
        let task_ids = self
            .releases
            .task_ids_for_tenant(tenant_id)
            .await?
            .into_iter()
            .filter(|id| !covered_tasks.contains(id))
            .collect();
        self.insert_not_required(environment_id, release_ids, task_ids)
            .await
    }

    /// Deletes every status row of a release.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError::Status`] when the rows cannot be
    /// deleted.
    pub async fn purge_release(&self, release_id: ReleaseId) -> MatrixMaintenanceResult<u64> {
        let removed = self.statuses.delete_release_statuses(release_id).await?;
        tracing::debug!(release_id = %release_id, removed, "removed release statuses");
        Ok(removed)
    }

    /// Deletes every status row of a task.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError::Status`] when the rows cannot be
    /// deleted.
    pub async fn purge_task(&self, task: &Task) -> MatrixMaintenanceResult<u64> {
        let removed = self.statuses.delete_task_statuses(task.id()).await?;
        tracing::debug!(task_id = %task.id(), removed, "removed task statuses");
        Ok(removed)
    }

    /// Deletes every release and task status row of an environment.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixMaintenanceError::Status`] when the rows cannot be
    /// deleted.
    pub async fn purge_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> MatrixMaintenanceResult<u64> {
        let removed = self
            .statuses
            .delete_statuses_for_environment(environment_id)
            .await?;
        tracing::info!(environment_id = %environment_id, removed, "removed environment statuses");
        Ok(removed)
    }

    async fn active_environment_ids(
        &self,
        tenant_id: TenantId,
    ) -> MatrixMaintenanceResult<Vec<EnvironmentId>> {
        Ok(self
            .environments
            .active_for_tenant(tenant_id)
            .await?
            .iter()
            .map(DeploymentEnvironment::id)
            .collect())
    }

    async fn insert_not_required(
        &self,
        environment_id: EnvironmentId,
        release_ids: Vec<ReleaseId>,
        task_ids: Vec<TaskId>,
    ) -> MatrixMaintenanceResult<()> {
        let release_rows: Vec<ReleaseStatus> = release_ids
            .into_iter()
            .map(|release_id| {
                ReleaseStatus::new(
                    release_id,
                    environment_id,
                    DeploymentTaskStatus::NotRequired,
                    &*self.clock,
                )
            })
            .collect();
        let task_rows: Vec<TaskStatus> = task_ids
            .into_iter()
            .map(|task_id| {
                TaskStatus::new(
                    task_id,
                    environment_id,
                    DeploymentTaskStatus::NotRequired,
                    &*self.clock,
                )
            })
            .collect();

        self.statuses
            .insert_release_statuses(&release_rows)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = %err,
                    environment_id = %environment_id,
                    "release status backfill for environment failed"
                );
            })?;
        self.statuses
            .insert_task_statuses(&task_rows)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = %err,
                    environment_id = %environment_id,
                    "task status backfill for environment failed"
                );
            })?;
        tracing::info!(
            environment_id = %environment_id,
            releases = release_rows.len(),
            tasks = task_rows.len(),
            "backfilled environment with NOT_REQUIRED statuses"
        );
        Ok(())
    }
}
