//! In-memory release and task repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    release::{
        domain::{PageRequest, Release, ReleaseId, Task, TaskId},
        ports::{ReleaseRepository, ReleaseRepositoryError, ReleaseRepositoryResult},
    },
    scope::TenantId,
};

/// Thread-safe in-memory repository for releases and their tasks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReleaseRepository {
    state: Arc<RwLock<InMemoryReleaseState>>,
}

#[derive(Debug, Default)]
struct InMemoryReleaseState {
    releases: HashMap<ReleaseId, Release>,
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryReleaseState {
    fn tenant_of(&self, release_id: ReleaseId) -> Option<TenantId> {
        self.releases.get(&release_id).map(Release::tenant_id)
    }
}

impl InMemoryReleaseRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ReleaseRepositoryResult<RwLockReadGuard<'_, InMemoryReleaseState>> {
        self.state.read().map_err(|err| {
            ReleaseRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ReleaseRepositoryResult<RwLockWriteGuard<'_, InMemoryReleaseState>> {
        self.state.write().map_err(|err| {
            ReleaseRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ReleaseRepository for InMemoryReleaseRepository {
    async fn store_release(&self, release: &Release) -> ReleaseRepositoryResult<()> {
        let mut state = self.write()?;
        if state.releases.contains_key(&release.id()) {
            return Err(ReleaseRepositoryError::DuplicateRelease(release.id()));
        }
        state.releases.insert(release.id(), release.clone());
        Ok(())
    }

    async fn find_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<Option<Release>> {
        Ok(self.read()?.releases.get(&id).cloned())
    }

    async fn delete_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<bool> {
        let mut state = self.write()?;
        if state.releases.remove(&id).is_none() {
            return Ok(false);
        }
        state.tasks.retain(|_, task| task.release_id() != id);
        Ok(true)
    }

    async fn release_ids_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> ReleaseRepositoryResult<Vec<ReleaseId>> {
        let state = self.read()?;
        let mut ids: Vec<ReleaseId> = state
            .releases
            .values()
            .filter(|release| release.tenant_id() == tenant_id)
            .map(Release::id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_release_page(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> ReleaseRepositoryResult<Vec<Release>> {
        let state = self.read()?;
        let mut releases: Vec<Release> = state
            .releases
            .values()
            .filter(|release| release.tenant_id() == tenant_id)
            .cloned()
            .collect();
        releases.sort_by(|left, right| {
            right
                .release_number()
                .cmp(left.release_number())
                .then_with(|| left.id().cmp(&right.id()))
        });
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.size()).unwrap_or(usize::MAX);
        Ok(releases.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_releases(&self, tenant_id: TenantId) -> ReleaseRepositoryResult<u64> {
        let state = self.read()?;
        let count = state
            .releases
            .values()
            .filter(|release| release.tenant_id() == tenant_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn store_task(&self, task: &Task) -> ReleaseRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.releases.contains_key(&task.release_id()) {
            return Err(ReleaseRepositoryError::ReleaseNotFound(task.release_id()));
        }
        if state.tasks.contains_key(&task.id()) {
            return Err(ReleaseRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> ReleaseRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(ReleaseRepositoryError::TaskNotFound(task.id()))?;
        *stored = task.clone();
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> ReleaseRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn tasks_for_release(
        &self,
        release_id: ReleaseId,
    ) -> ReleaseRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.release_id() == release_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.created_at(), task.id()));
        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId) -> ReleaseRepositoryResult<bool> {
        Ok(self.write()?.tasks.remove(&id).is_some())
    }

    async fn task_ids_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> ReleaseRepositoryResult<Vec<TaskId>> {
        let state = self.read()?;
        let mut ids: Vec<TaskId> = state
            .tasks
            .values()
            .filter(|task| state.tenant_of(task.release_id()) == Some(tenant_id))
            .map(Task::id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
