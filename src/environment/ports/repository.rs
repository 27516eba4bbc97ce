//! Repository port for deployment environments.

use crate::{
    environment::domain::{DeploymentEnvironment, EnvironmentId},
    scope::TenantId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for environment repository operations.
pub type EnvironmentRepositoryResult<T> = Result<T, EnvironmentRepositoryError>;

/// Environment persistence contract.
#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    /// Stores a new environment.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentRepositoryError::DuplicateEnvironment`] when the
    /// identifier already exists.
    async fn store(&self, environment: &DeploymentEnvironment) -> EnvironmentRepositoryResult<()>;

    /// Persists name and soft-deletion changes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentRepositoryError::NotFound`] when the environment
    /// does not exist.
    async fn update(&self, environment: &DeploymentEnvironment)
    -> EnvironmentRepositoryResult<()>;

    /// Finds an environment by identifier, including soft-deleted ones.
    async fn find_by_id(
        &self,
        id: EnvironmentId,
    ) -> EnvironmentRepositoryResult<Option<DeploymentEnvironment>>;

    /// Returns the tenant's environments that are not soft-deleted, ordered
    /// by name.
    async fn active_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> EnvironmentRepositoryResult<Vec<DeploymentEnvironment>>;

    /// Removes an environment row. Returns `false` when nothing was removed.
    async fn hard_delete(&self, id: EnvironmentId) -> EnvironmentRepositoryResult<bool>;
}

/// Errors returned by environment repository implementations.
#[derive(Debug, Clone, Error)]
pub enum EnvironmentRepositoryError {
    /// An environment with the same identifier already exists.
    #[error("duplicate environment identifier: {0}")]
    DuplicateEnvironment(EnvironmentId),

    /// The environment was not found.
    #[error("environment not found: {0}")]
    NotFound(EnvironmentId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EnvironmentRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
