//! In-memory status matrix.
//!
//! Batch inserts are applied row by row: a duplicate part-way through a batch
//! leaves the earlier rows in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    environment::domain::EnvironmentId,
    release::{
        domain::{
            DeploymentTaskStatus, ReleaseId, ReleaseStatus, ReleaseStatusId, TaskId, TaskStatus,
            TaskStatusId,
        },
        ports::{StatusRepository, StatusRepositoryError, StatusRepositoryResult},
    },
};

/// Thread-safe in-memory status repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusRepository {
    state: Arc<RwLock<InMemoryStatusState>>,
}

#[derive(Debug, Default)]
struct InMemoryStatusState {
    release_statuses: HashMap<ReleaseStatusId, ReleaseStatus>,
    task_statuses: HashMap<TaskStatusId, TaskStatus>,
}

impl InMemoryStatusRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of release and task status rows held.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn row_counts(&self) -> StatusRepositoryResult<(usize, usize)> {
        let state = self.read()?;
        Ok((state.release_statuses.len(), state.task_statuses.len()))
    }

    fn read(&self) -> StatusRepositoryResult<RwLockReadGuard<'_, InMemoryStatusState>> {
        self.state.read().map_err(|err| {
            StatusRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> StatusRepositoryResult<RwLockWriteGuard<'_, InMemoryStatusState>> {
        self.state.write().map_err(|err| {
            StatusRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn count(removed: usize) -> u64 {
    u64::try_from(removed).unwrap_or(u64::MAX)
}

#[async_trait]
impl StatusRepository for InMemoryStatusRepository {
    async fn insert_release_statuses(
        &self,
        statuses: &[ReleaseStatus],
    ) -> StatusRepositoryResult<()> {
        let mut state = self.write()?;
        for status in statuses {
            let duplicate = state.release_statuses.values().any(|existing| {
                existing.release_id() == status.release_id()
                    && existing.environment_id() == status.environment_id()
            });
            if duplicate {
                return Err(StatusRepositoryError::DuplicateReleaseStatus {
                    release_id: status.release_id(),
                    environment_id: status.environment_id(),
                });
            }
            state.release_statuses.insert(status.id(), status.clone());
        }
        Ok(())
    }

    async fn insert_task_statuses(&self, statuses: &[TaskStatus]) -> StatusRepositoryResult<()> {
        let mut state = self.write()?;
        for status in statuses {
            let duplicate = state.task_statuses.values().any(|existing| {
                existing.task_id() == status.task_id()
                    && existing.environment_id() == status.environment_id()
            });
            if duplicate {
                return Err(StatusRepositoryError::DuplicateTaskStatus {
                    task_id: status.task_id(),
                    environment_id: status.environment_id(),
                });
            }
            state.task_statuses.insert(status.id(), status.clone());
        }
        Ok(())
    }

    async fn find_release_statuses_by_release(
        &self,
        release_id: ReleaseId,
    ) -> StatusRepositoryResult<Vec<ReleaseStatus>> {
        let state = self.read()?;
        let mut statuses: Vec<ReleaseStatus> = state
            .release_statuses
            .values()
            .filter(|status| status.release_id() == release_id)
            .cloned()
            .collect();
        statuses.sort_by_key(ReleaseStatus::environment_id);
        Ok(statuses)
    }

    async fn find_task_statuses_by_task(
        &self,
        task_id: TaskId,
    ) -> StatusRepositoryResult<Vec<TaskStatus>> {
        let state = self.read()?;
        let mut statuses: Vec<TaskStatus> = state
            .task_statuses
            .values()
            .filter(|status| status.task_id() == task_id)
            .cloned()
            .collect();
        statuses.sort_by_key(TaskStatus::environment_id);
        Ok(statuses)
    }

    async fn find_release_status(
        &self,
        id: ReleaseStatusId,
    ) -> StatusRepositoryResult<Option<ReleaseStatus>> {
        Ok(self.read()?.release_statuses.get(&id).cloned())
    }

    async fn find_task_status(
        &self,
        id: TaskStatusId,
    ) -> StatusRepositoryResult<Option<TaskStatus>> {
        Ok(self.read()?.task_statuses.get(&id).cloned())
    }

    async fn update_release_status(
        &self,
        id: ReleaseStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        let mut state = self.write()?;
        Ok(state
            .release_statuses
            .get_mut(&id)
            .map_or(0, |row| {
                row.set_status(status, updated_at);
                1
            }))
    }

    async fn update_task_status(
        &self,
        id: TaskStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        let mut state = self.write()?;
        Ok(state.task_statuses.get_mut(&id).map_or(0, |row| {
            row.set_status(status, updated_at);
            1
        }))
    }

    async fn delete_release_statuses(&self, release_id: ReleaseId) -> StatusRepositoryResult<u64> {
        let mut state = self.write()?;
        let before = state.release_statuses.len();
        state
            .release_statuses
            .retain(|_, status| status.release_id() != release_id);
        Ok(count(before - state.release_statuses.len()))
    }

    async fn delete_task_statuses(&self, task_id: TaskId) -> StatusRepositoryResult<u64> {
        let mut state = self.write()?;
        let before = state.task_statuses.len();
        state
            .task_statuses
            .retain(|_, status| status.task_id() != task_id);
        Ok(count(before - state.task_statuses.len()))
    }

    async fn delete_statuses_for_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<u64> {
        let mut state = self.write()?;
        let before = state.release_statuses.len() + state.task_statuses.len();
        state
            .release_statuses
            .retain(|_, status| status.environment_id() != environment_id);
        state
            .task_statuses
            .retain(|_, status| status.environment_id() != environment_id);
        let after = state.release_statuses.len() + state.task_statuses.len();
        Ok(count(before - after))
    }

    async fn release_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<ReleaseId>> {
        let state = self.read()?;
        let mut ids: Vec<ReleaseId> = state
            .release_statuses
            .values()
            .filter(|status| status.environment_id() == environment_id)
            .map(ReleaseStatus::release_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn task_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<TaskId>> {
        let state = self.read()?;
        let mut ids: Vec<TaskId> = state
            .task_statuses
            .values()
            .filter(|status| status.environment_id() == environment_id)
            .map(TaskStatus::task_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
