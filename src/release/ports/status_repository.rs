//! Repository port for the status matrix.

use crate::{
    environment::domain::EnvironmentId,
    release::domain::{
        DeploymentTaskStatus, ReleaseId, ReleaseStatus, ReleaseStatusId, TaskId, TaskStatus,
        TaskStatusId,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for status repository operations.
pub type StatusRepositoryResult<T> = Result<T, StatusRepositoryError>;

/// Persistence contract for release and task status rows.
///
/// Batch inserts may be applied row by row or atomically; callers must not
/// rely on either.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Inserts release status rows.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::DuplicateReleaseStatus`] when a row
    /// already exists for one of the (release, environment) pairs.
    async fn insert_release_statuses(
        &self,
        statuses: &[ReleaseStatus],
    ) -> StatusRepositoryResult<()>;

    /// Inserts task status rows.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::DuplicateTaskStatus`] when a row
    /// already exists for one of the (task, environment) pairs.
    async fn insert_task_statuses(&self, statuses: &[TaskStatus]) -> StatusRepositoryResult<()>;

    /// Returns every status row of a release.
    async fn find_release_statuses_by_release(
        &self,
        release_id: ReleaseId,
    ) -> StatusRepositoryResult<Vec<ReleaseStatus>>;

    /// Returns every status row of a task.
    async fn find_task_statuses_by_task(
        &self,
        task_id: TaskId,
    ) -> StatusRepositoryResult<Vec<TaskStatus>>;

    /// Finds one release status row.
    async fn find_release_status(
        &self,
        id: ReleaseStatusId,
    ) -> StatusRepositoryResult<Option<ReleaseStatus>>;

    /// Finds one task status row.
    async fn find_task_status(&self, id: TaskStatusId)
    -> StatusRepositoryResult<Option<TaskStatus>>;

    /// Sets the status of a release status row and returns the number of
    /// rows affected.
    async fn update_release_status(
        &self,
        id: ReleaseStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64>;

    /// Sets the status of a task status row and returns the number of rows
    /// affected.
    async fn update_task_status(
        &self,
        id: TaskStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64>;

    /// Deletes every status row of a release.
    async fn delete_release_statuses(&self, release_id: ReleaseId) -> StatusRepositoryResult<u64>;

    /// Deletes every status row of a task.
    async fn delete_task_statuses(&self, task_id: TaskId) -> StatusRepositoryResult<u64>;

    /// Deletes every release and task status row referencing an environment.
    async fn delete_statuses_for_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<u64>;

    /// Returns the releases that already have a row for the environment.
    async fn release_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<ReleaseId>>;

    /// Returns the tasks that already have a row for the environment.
    async fn task_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<TaskId>>;
}

/// Errors returned by status repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StatusRepositoryError {
    /// A release status row already exists for the pair.
    #[error("release {release_id} already has a status for environment {environment_id}")]
    DuplicateReleaseStatus {
        /// Release of the rejected row.
        release_id: ReleaseId,
        /// Environment of the rejected row.
        environment_id: EnvironmentId,
    },

    /// A task status row already exists for the pair.
    #[error("task {task_id} already has a status for environment {environment_id}")]
    DuplicateTaskStatus {
        /// Task of the rejected row.
        task_id: TaskId,
        /// Environment of the rejected row.
        environment_id: EnvironmentId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StatusRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
