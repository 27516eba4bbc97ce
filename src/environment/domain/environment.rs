//! Deployment environment aggregate.

use super::{EnvironmentDomainError, EnvironmentId};
use crate::scope::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated, trimmed environment name such as `DEV` or `PROD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    /// Creates a validated environment name.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentDomainError::EmptyName`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, EnvironmentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EnvironmentDomainError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deployment target against which release progress is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEnvironment {
    id: EnvironmentId,
    name: EnvironmentName,
    tenant_id: TenantId,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEnvironmentData {
    /// Persisted identifier.
    pub id: EnvironmentId,
    /// Persisted name.
    pub name: EnvironmentName,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Soft-deletion flag.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DeploymentEnvironment {
    /// Creates a new, active environment.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: EnvironmentName, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: EnvironmentId::new(),
            name,
            tenant_id,
            deleted: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an environment from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEnvironmentData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            tenant_id: data.tenant_id,
            deleted: data.deleted,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the environment identifier.
    #[must_use]
    pub const fn id(&self) -> EnvironmentId {
        self.id
    }

    /// Returns the environment name.
    #[must_use]
    pub const fn name(&self) -> &EnvironmentName {
        &self.name
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns `true` unless the environment has been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Renames the environment.
    pub fn rename(&mut self, name: EnvironmentName, clock: &impl Clock) {
        self.name = name;
        self.updated_at = clock.utc();
    }

    /// Soft-deletes the environment. Returns `false` when it was already
    /// inactive.
    pub fn deactivate(&mut self, clock: &impl Clock) -> bool {
        self.set_deleted(true, clock)
    }

    /// Reverses a soft delete. Returns `false` when it was already active.
    pub fn reactivate(&mut self, clock: &impl Clock) -> bool {
        self.set_deleted(false, clock)
    }

    fn set_deleted(&mut self, deleted: bool, clock: &impl Clock) -> bool {
        if self.deleted == deleted {
            return false;
        }
        self.deleted = deleted;
        self.updated_at = clock.utc();
        true
    }
}
