//! Service operations behind the release and task endpoints.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use thiserror::Error;

use super::{
    MatrixMaintainer, MatrixMaintenanceError, RecalculationError, RecalculationOrchestrator,
    ReleaseLocks, ReleaseStatusChange,
};
use crate::{
    audit::{
        AuditTrail,
        domain::{AuditAction, AuditRecordType},
        ports::AuditSink,
    },
    environment::ports::{EnvironmentRepository, EnvironmentRepositoryError},
    release::{
        domain::{
            DeploymentTaskStatus, Page, PageRequest, Release, ReleaseDomainError, ReleaseId,
            ReleaseNumber, ReleaseStage, ReleaseStatus, ReleaseStatusId, ReleaseWithStatus,
            StatusTransition, Task, TaskDetails, TaskId, TaskStatus, TaskStatusId,
            TaskWithStatus,
        },
        ports::{ReleaseRepository, ReleaseRepositoryError, StatusRepository, StatusRepositoryError},
    },
    scope::{MissingTenantScope, RequestContext, TenantId},
};

/// Request payload for creating or editing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    stage: ReleaseStage,
    summary: String,
    description: Option<String>,
    component: String,
}

impl TaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(
        stage: ReleaseStage,
        summary: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            summary: summary.into(),
            description: None,
            component: component.into(),
        }
    }

    /// Sets the long description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn into_details(self) -> Result<TaskDetails, ReleaseDomainError> {
        TaskDetails::new(self.stage, self.summary, self.description, self.component)
    }
}

/// Outcome of a task status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusUpdate {
    /// The row after the write.
    pub status: TaskStatus,
    /// Release status rows changed by the recalculation that followed.
    ///
    /// Empty when nothing changed or the row could not be traced back to a
    /// release.
    pub release_changes: Vec<ReleaseStatusChange>,
}

/// Service-level errors for manual deployment operations.
#[derive(Debug, Error)]
pub enum ManualDeploymentError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] ReleaseDomainError),
    /// The request carries no tenant.
    #[error(transparent)]
    MissingScope(#[from] MissingTenantScope),
    /// The release does not exist for the tenant.
    #[error("release not found: {0}")]
    ReleaseNotFound(ReleaseId),
    /// The task does not exist for the tenant.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The release status row does not exist for the tenant.
    #[error("release status not found: {0}")]
    ReleaseStatusNotFound(ReleaseStatusId),
    /// The task status row does not exist for the tenant.
    #[error("task status not found: {0}")]
    TaskStatusNotFound(TaskStatusId),
    /// Environment lookup failed.
    #[error(transparent)]
    EnvironmentRepository(#[from] EnvironmentRepositoryError),
    /// Release or task persistence failed.
    #[error(transparent)]
    ReleaseRepository(#[from] ReleaseRepositoryError),
    /// Status persistence failed.
    #[error(transparent)]
    StatusRepository(#[from] StatusRepositoryError),
    /// The status matrix could not be maintained.
    #[error(transparent)]
    Matrix(#[from] MatrixMaintenanceError),
    /// Recalculation failed.
    #[error(transparent)]
    Recalculation(#[from] RecalculationError),
}

/// Result type for manual deployment operations.
pub type ManualDeploymentResult<T> = Result<T, ManualDeploymentError>;

/// Releases, tasks and their status matrix.
#[derive(Clone)]
pub struct ManualDeploymentService<R, S, E, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    releases: Arc<R>,
    statuses: Arc<S>,
    environments: Arc<E>,
    matrix: MatrixMaintainer<R, S, E, C>,
    orchestrator: RecalculationOrchestrator<R, S, A, C>,
    audit: AuditTrail<A, C>,
    clock: Arc<C>,
}

impl<R, S, E, A, C> ManualDeploymentService<R, S, E, A, C>
where
    R: ReleaseRepository,
    S: StatusRepository,
    E: EnvironmentRepository,
    A: AuditSink,
    C: Clock + Send + Sync,
{
    /// Creates a service with its own release lock table.
    #[must_use]
    pub fn new(
        releases: Arc<R>,
        statuses: Arc<S>,
        environments: Arc<E>,
        audit_sink: Arc<A>,
        clock: Arc<C>,
    ) -> Self {
        let audit = AuditTrail::new(audit_sink, Arc::clone(&clock));
        let matrix = MatrixMaintainer::new(
            Arc::clone(&releases),
            Arc::clone(&statuses),
            Arc::clone(&environments),
            Arc::clone(&clock),
        );
        let orchestrator = RecalculationOrchestrator::new(
            Arc::clone(&releases),
            Arc::clone(&statuses),
            audit.clone(),
            Arc::clone(&clock),
            ReleaseLocks::new(),
        );
        Self {
            releases,
            statuses,
            environments,
            matrix,
            orchestrator,
            audit,
            clock,
        }
    }

    /// Creates a release with a `PENDING` status in every active
    /// environment. The release and each status row are audited as created.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::MissingScope`] when the request has no
    /// tenant, [`ManualDeploymentError::Domain`] for a blank release number,
    /// and persistence errors otherwise.
    pub async fn add_release(
        &self,
        context: &RequestContext,
        release_number: &str,
    ) -> ManualDeploymentResult<ReleaseWithStatus> {
        let tenant_id = context.require_tenant()?;
        let number = ReleaseNumber::new(release_number)?;
        let release = Release::new(tenant_id, number, &*self.clock);
        self.releases.store_release(&release).await?;
        let statuses = self.matrix.backfill_release(&release).await?;

        self.audit
            .record(
                context,
                release.id().into_inner(),
                AuditRecordType::Release,
                AuditAction::Created,
                json!({ "release_number": release.release_number().as_str() }),
            )
            .await;
        for status in &statuses {
            self.audit
                .record(
                    context,
                    status.id().into_inner(),
                    AuditRecordType::ReleaseStatus,
                    AuditAction::Created,
                    json!({
                        "release_id": status.release_id(),
                        "environment_id": status.environment_id(),
                        "status": status.status().as_str(),
                    }),
                )
                .await;
        }
        tracing::info!(
            release_id = %release.id(),
            tenant_id = %tenant_id,
            release_number = %release.release_number(),
            "release created"
        );
        Ok(ReleaseWithStatus::new(release, statuses))
    }

    /// Adds a task to a release with a `PENDING` status in every active
    /// environment, then recalculates the release. The task and each status
    /// row are audited as created.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::ReleaseNotFound`] when the tenant
    /// owns no such release and [`ManualDeploymentError::Domain`] for invalid
    /// task fields.
    pub async fn add_task(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
        request: TaskRequest,
    ) -> ManualDeploymentResult<TaskWithStatus> {
        let tenant_id = context.require_tenant()?;
        let details = request.into_details()?;
        let release = self.owned_release(tenant_id, release_id).await?;

        let task = Task::new(release.id(), details, &*self.clock);
        self.releases.store_task(&task).await?;
        let statuses = self.matrix.backfill_task(tenant_id, &task).await?;
        self.audit
            .record(
                context,
                task.id().into_inner(),
                AuditRecordType::Task,
                AuditAction::Created,
                json!({
                    "release_id": release.id(),
                    "stage": task.details().stage().as_str(),
                    "summary": task.details().summary(),
                }),
            )
            .await;
        for status in &statuses {
            self.audit
                .record(
                    context,
                    status.id().into_inner(),
                    AuditRecordType::TaskStatus,
                    AuditAction::Created,
                    json!({
                        "task_id": status.task_id(),
                        "environment_id": status.environment_id(),
                        "status": status.status().as_str(),
                    }),
                )
                .await;
        }
        tracing::info!(task_id = %task.id(), release_id = %release.id(), "task created");

        self.orchestrator.recalculate(context, release.id()).await?;
        Ok(TaskWithStatus::new(task, statuses))
    }

    /// Edits a task. Statuses are not touched and no recalculation runs.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::TaskNotFound`] when the tenant owns no
    /// such task and [`ManualDeploymentError::Domain`] for invalid fields.
    pub async fn update_task(
        &self,
        context: &RequestContext,
        task_id: TaskId,
        request: TaskRequest,
    ) -> ManualDeploymentResult<Task> {
        let tenant_id = context.require_tenant()?;
        let details = request.into_details()?;
        let mut task = self.owned_task(tenant_id, task_id).await?;
        task.edit(details, &*self.clock);
        self.releases.update_task(&task).await?;
        self.audit
            .record(
                context,
                task.id().into_inner(),
                AuditRecordType::Task,
                AuditAction::Updated,
                json!({
                    "stage": task.details().stage().as_str(),
                    "summary": task.details().summary(),
                    "component": task.details().component(),
                }),
            )
            .await;
        Ok(task)
    }

    /// Overrides one release status row. No other row changes; the next task
    /// status change for the release may overwrite the value.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::ReleaseStatusNotFound`] when the row
    /// does not exist for the tenant or no row was updated.
    pub async fn set_release_status(
        &self,
        context: &RequestContext,
        status_id: ReleaseStatusId,
        status: DeploymentTaskStatus,
    ) -> ManualDeploymentResult<ReleaseStatus> {
        let tenant_id = context.require_tenant()?;
        let row = self
            .statuses
            .find_release_status(status_id)
            .await?
            .ok_or(ManualDeploymentError::ReleaseStatusNotFound(status_id))?;
        self.owned_release(tenant_id, row.release_id())
            .await
            .map_err(|err| match err {
                ManualDeploymentError::ReleaseNotFound(_) => {
                    ManualDeploymentError::ReleaseStatusNotFound(status_id)
                }
                other => other,
            })?;

        let _guard = self.orchestrator.locks().acquire(row.release_id()).await;
        let mut current = self
            .statuses
            .find_release_status(status_id)
            .await?
            .ok_or(ManualDeploymentError::ReleaseStatusNotFound(status_id))?;
        let now = self.clock.utc();
        let affected = self
            .statuses
            .update_release_status(status_id, status, now)
            .await?;
        if affected == 0 {
            return Err(ManualDeploymentError::ReleaseStatusNotFound(status_id));
        }

        let transition = StatusTransition {
            from: current.status(),
            to: status,
        };
        current.set_status(status, now);
        if transition.from != transition.to {
            tracing::info!(
                status_id = %status_id,
                release_id = %current.release_id(),
                from = %transition.from,
                to = %transition.to,
                "release status overridden"
            );
            self.audit
                .record(
                    context,
                    status_id.into_inner(),
                    AuditRecordType::ReleaseStatus,
                    AuditAction::Updated,
                    transition.to_details(),
                )
                .await;
        }
        Ok(current)
    }

    /// Sets one task status row and recalculates the owning release.
    ///
    /// When the row cannot be traced back to a task and release, ownership
    /// is taken from the row's environment; the write still happens and the
    /// recalculation is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::TaskStatusNotFound`] when the row does
    /// not exist for the tenant or no row was updated.
    pub async fn set_task_status(
        &self,
        context: &RequestContext,
        status_id: TaskStatusId,
        status: DeploymentTaskStatus,
    ) -> ManualDeploymentResult<TaskStatusUpdate> {
        let tenant_id = context.require_tenant()?;
        let row = self
            .statuses
            .find_task_status(status_id)
            .await?
            .ok_or(ManualDeploymentError::TaskStatusNotFound(status_id))?;

        let Some(release) = self.release_of_task(row.task_id()).await? else {
            if !self.environment_owned_by(tenant_id, &row).await? {
                return Err(ManualDeploymentError::TaskStatusNotFound(status_id));
            }
            let updated = self.write_task_status(context, row, status).await?;
            tracing::warn!(
                status_id = %status_id,
                task_id = %updated.task_id(),
                "task status has no owning release, recalculation skipped"
            );
            return Ok(TaskStatusUpdate {
                status: updated,
                release_changes: Vec::new(),
            });
        };
        if release.tenant_id() != tenant_id {
            return Err(ManualDeploymentError::TaskStatusNotFound(status_id));
        }

        let _guard = self.orchestrator.locks().acquire(release.id()).await;
        let current = self
            .statuses
            .find_task_status(status_id)
            .await?
            .ok_or(ManualDeploymentError::TaskStatusNotFound(status_id))?;
        let updated = self.write_task_status(context, current, status).await?;
        let release_changes = self
            .orchestrator
            .recalculate_held(context, release.id())
            .await?;
        Ok(TaskStatusUpdate {
            status: updated,
            release_changes,
        })
    }

    /// Deletes a release together with its tasks and every status row.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::ReleaseNotFound`] when the tenant
    /// owns no such release.
    pub async fn delete_release(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> ManualDeploymentResult<()> {
        let tenant_id = context.require_tenant()?;
        let release = self.owned_release(tenant_id, release_id).await?;

        {
            let _guard = self.orchestrator.locks().acquire(release.id()).await;
            for task in self.releases.tasks_for_release(release.id()).await? {
                self.matrix.purge_task(&task).await?;
            }
            self.matrix.purge_release(release.id()).await?;
            if !self.releases.delete_release(release.id()).await? {
                return Err(ManualDeploymentError::ReleaseNotFound(release_id));
            }
        }
        self.orchestrator.locks().forget(release.id());

        self.audit
            .record(
                context,
                release.id().into_inner(),
                AuditRecordType::Release,
                AuditAction::Deleted,
                json!({ "release_number": release.release_number().as_str() }),
            )
            .await;
        tracing::info!(release_id = %release.id(), "release deleted");
        Ok(())
    }

    /// Deletes a task and its status rows, then recalculates the owning
    /// release.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::TaskNotFound`] when the tenant owns no
    /// such task.
    pub async fn delete_task(
        &self,
        context: &RequestContext,
        task_id: TaskId,
    ) -> ManualDeploymentResult<Vec<ReleaseStatusChange>> {
        let tenant_id = context.require_tenant()?;
        let task = self.owned_task(tenant_id, task_id).await?;

        let _guard = self.orchestrator.locks().acquire(task.release_id()).await;
        self.matrix.purge_task(&task).await?;
        if !self.releases.delete_task(task.id()).await? {
            return Err(ManualDeploymentError::TaskNotFound(task_id));
        }
        self.audit
            .record(
                context,
                task.id().into_inner(),
                AuditRecordType::Task,
                AuditAction::Deleted,
                json!({ "release_id": task.release_id() }),
            )
            .await;
        tracing::info!(task_id = %task.id(), release_id = %task.release_id(), "task deleted");

        Ok(self
            .orchestrator
            .recalculate_held(context, task.release_id())
            .await?)
    }

    /// Recalculates a release on demand.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::Recalculation`] when the release does
    /// not exist for the tenant or storage fails.
    pub async fn recalculate(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> ManualDeploymentResult<Vec<ReleaseStatusChange>> {
        Ok(self.orchestrator.recalculate(context, release_id).await?)
    }

    /// Returns a release with its status in every environment.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::ReleaseNotFound`] when the tenant
    /// owns no such release.
    pub async fn find_release(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> ManualDeploymentResult<ReleaseWithStatus> {
        let tenant_id = context.require_tenant()?;
        let release = self.owned_release(tenant_id, release_id).await?;
        let statuses = self
            .statuses
            .find_release_statuses_by_release(release.id())
            .await?;
        Ok(ReleaseWithStatus::new(release, statuses))
    }

    /// Returns one page of the tenant's releases, newest release number
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::MissingScope`] when the request has no
    /// tenant and persistence errors otherwise.
    pub async fn list_releases(
        &self,
        context: &RequestContext,
        page: PageRequest,
    ) -> ManualDeploymentResult<Page<ReleaseWithStatus>> {
        let tenant_id = context.require_tenant()?;
        let total_elements = self.releases.count_releases(tenant_id).await?;
        let releases = self.releases.find_release_page(tenant_id, page).await?;

        let mut content = Vec::with_capacity(releases.len());
        for release in releases {
            let statuses = self
                .statuses
                .find_release_statuses_by_release(release.id())
                .await?;
            content.push(ReleaseWithStatus::new(release, statuses));
        }
        Ok(Page {
            number: page.number(),
            size: page.size(),
            total_elements,
            content,
        })
    }

    /// Returns the tasks of a release with their status in every
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ManualDeploymentError::ReleaseNotFound`] when the tenant
    /// owns no such release.
    pub async fn tasks_for_release(
        &self,
        context: &RequestContext,
        release_id: ReleaseId,
    ) -> ManualDeploymentResult<Vec<TaskWithStatus>> {
        let tenant_id = context.require_tenant()?;
        let release = self.owned_release(tenant_id, release_id).await?;

        let tasks = self.releases.tasks_for_release(release.id()).await?;
        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            let statuses = self.statuses.find_task_statuses_by_task(task.id()).await?;
            views.push(TaskWithStatus::new(task, statuses));
        }
        Ok(views)
    }

    async fn owned_release(
        &self,
        tenant_id: TenantId,
        release_id: ReleaseId,
    ) -> ManualDeploymentResult<Release> {
        self.releases
            .find_release(release_id)
            .await?
            .filter(|release| release.tenant_id() == tenant_id)
            .ok_or(ManualDeploymentError::ReleaseNotFound(release_id))
    }

    async fn owned_task(
        &self,
        tenant_id: TenantId,
        task_id: TaskId,
    ) -> ManualDeploymentResult<Task> {
        let task = self
            .releases
            .find_task(task_id)
            .await?
            .ok_or(ManualDeploymentError::TaskNotFound(task_id))?;
        self.owned_release(tenant_id, task.release_id())
            .await
            .map_err(|err| match err {
                ManualDeploymentError::ReleaseNotFound(_) => {
                    ManualDeploymentError::TaskNotFound(task_id)
                }
                other => other,
            })?;
        Ok(task)
    }

    async fn release_of_task(&self, task_id: TaskId) -> ManualDeploymentResult<Option<Release>> {
        let Some(task) = self.releases.find_task(task_id).await? else {
            return Ok(None);
        };
        Ok(self.releases.find_release(task.release_id()).await?)
    }

    /// Falls back to the row's environment for ownership when its task is
    /// gone.
    async fn environment_owned_by(
        &self,
        tenant_id: TenantId,
        row: &TaskStatus,
    ) -> ManualDeploymentResult<bool> {
        Ok(self
            .environments
            .find_by_id(row.environment_id())
            .await?
            .is_some_and(|environment| environment.tenant_id() == tenant_id))
    }

    async fn write_task_status(
        &self,
        context: &RequestContext,
        mut row: TaskStatus,
        status: DeploymentTaskStatus,
    ) -> ManualDeploymentResult<TaskStatus> {
        let now = self.clock.utc();
        let affected = self
            .statuses
            .update_task_status(row.id(), status, now)
            .await?;
        if affected == 0 {
            return Err(ManualDeploymentError::TaskStatusNotFound(row.id()));
        }

        let transition = StatusTransition {
            from: row.status(),
            to: status,
        };
        row.set_status(status, now);
        if transition.from != transition.to {
            tracing::info!(
                status_id = %row.id(),
                task_id = %row.task_id(),
                environment_id = %row.environment_id(),
                from = %transition.from,
                to = %transition.to,
                "task status changed"
            );
            self.audit
                .record(
                    context,
                    row.id().into_inner(),
                    AuditRecordType::TaskStatus,
                    AuditAction::Updated,
                    transition.to_details(),
                )
                .await;
        }
        Ok(row)
    }
}
