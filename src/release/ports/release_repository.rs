//! Repository port for releases and their tasks.

use crate::{
    release::domain::{PageRequest, Release, ReleaseId, Task, TaskId},
    scope::TenantId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for release repository operations.
pub type ReleaseRepositoryResult<T> = Result<T, ReleaseRepositoryError>;

/// Persistence contract for releases and the tasks they own.
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Stores a new release.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseRepositoryError::DuplicateRelease`] when the
    /// identifier already exists.
    async fn store_release(&self, release: &Release) -> ReleaseRepositoryResult<()>;

    /// Finds a release by identifier.
    async fn find_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<Option<Release>>;

    /// Removes a release and every task it owns. Returns `false` when no
    /// release was removed.
    async fn delete_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<bool>;

    /// Returns the identifiers of every release owned by the tenant.
    async fn release_ids_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> ReleaseRepositoryResult<Vec<ReleaseId>>;

    /// Returns one page of the tenant's releases ordered by release number,
    /// newest first.
    async fn find_release_page(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> ReleaseRepositoryResult<Vec<Release>>;

    /// Counts the tenant's releases.
    async fn count_releases(&self, tenant_id: TenantId) -> ReleaseRepositoryResult<u64>;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseRepositoryError::DuplicateTask`] when the identifier
    /// already exists or [`ReleaseRepositoryError::ReleaseNotFound`] when the
    /// owning release does not exist.
    async fn store_task(&self, task: &Task) -> ReleaseRepositoryResult<()>;

    /// Persists edits to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task(&self, task: &Task) -> ReleaseRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> ReleaseRepositoryResult<Option<Task>>;

    /// Returns every task of a release.
    async fn tasks_for_release(&self, release_id: ReleaseId)
    -> ReleaseRepositoryResult<Vec<Task>>;

    /// Removes a task. Returns `false` when no task was removed.
    async fn delete_task(&self, id: TaskId) -> ReleaseRepositoryResult<bool>;

    /// Returns the identifiers of every task under the tenant's releases.
    async fn task_ids_for_tenant(&self, tenant_id: TenantId) -> ReleaseRepositoryResult<Vec<TaskId>>;
}

/// Errors returned by release repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ReleaseRepositoryError {
    /// A release with the same identifier already exists.
    #[error("duplicate release identifier: {0}")]
    DuplicateRelease(ReleaseId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The referenced release does not exist.
    #[error("release not found: {0}")]
    ReleaseNotFound(ReleaseId),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReleaseRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
