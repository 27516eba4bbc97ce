//! In-memory environment repository for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    environment::{
        domain::{DeploymentEnvironment, EnvironmentId},
        ports::{EnvironmentRepository, EnvironmentRepositoryError, EnvironmentRepositoryResult},
    },
    scope::TenantId,
};

/// Thread-safe in-memory environment repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEnvironmentRepository {
    environments: Arc<RwLock<HashMap<EnvironmentId, DeploymentEnvironment>>>,
}

impl InMemoryEnvironmentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> EnvironmentRepositoryResult<RwLockReadGuard<'_, HashMap<EnvironmentId, DeploymentEnvironment>>>
    {
        self.environments.read().map_err(|err| {
            EnvironmentRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> EnvironmentRepositoryResult<
        RwLockWriteGuard<'_, HashMap<EnvironmentId, DeploymentEnvironment>>,
    > {
        self.environments.write().map_err(|err| {
            EnvironmentRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryEnvironmentRepository {
    async fn store(&self, environment: &DeploymentEnvironment) -> EnvironmentRepositoryResult<()> {
        let mut environments = self.write()?;
        if environments.contains_key(&environment.id()) {
            return Err(EnvironmentRepositoryError::DuplicateEnvironment(
                environment.id(),
            ));
        }
        environments.insert(environment.id(), environment.clone());
        Ok(())
    }

    async fn update(
        &self,
        environment: &DeploymentEnvironment,
    ) -> EnvironmentRepositoryResult<()> {
        let mut environments = self.write()?;
        let stored = environments
            .get_mut(&environment.id())
            .ok_or(EnvironmentRepositoryError::NotFound(environment.id()))?;
        *stored = environment.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: EnvironmentId,
    ) -> EnvironmentRepositoryResult<Option<DeploymentEnvironment>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn active_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> EnvironmentRepositoryResult<Vec<DeploymentEnvironment>> {
        let mut active: Vec<DeploymentEnvironment> = self
            .read()?
            .values()
            .filter(|environment| environment.tenant_id() == tenant_id && environment.is_active())
            .cloned()
            .collect();
        active.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(active)
    }

    async fn hard_delete(&self, id: EnvironmentId) -> EnvironmentRepositoryResult<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }
}
