//! Release aggregate.

use super::{ReleaseDomainError, ReleaseId};
use crate::scope::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Release number such as `2025.1`. Not unique; blank values are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseNumber(String);

impl ReleaseNumber {
    /// Creates a validated release number.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyReleaseNumber`] when the value is
    /// blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ReleaseDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReleaseDomainError::EmptyReleaseNumber);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the release number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Container for the manual deployment tasks of one release.
///
/// Releases are created and deleted but never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    id: ReleaseId,
    release_number: ReleaseNumber,
    tenant_id: TenantId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReleaseData {
    /// Persisted identifier.
    pub id: ReleaseId,
    /// Persisted release number.
    pub release_number: ReleaseNumber,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Release {
    /// Creates a new release owned by `tenant_id`.
    #[must_use]
    pub fn new(tenant_id: TenantId, release_number: ReleaseNumber, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ReleaseId::new(),
            release_number,
            tenant_id,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a release from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReleaseData) -> Self {
        Self {
            id: data.id,
            release_number: data.release_number,
            tenant_id: data.tenant_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn id(&self) -> ReleaseId {
        self.id
    }

    /// Returns the release number.
    #[must_use]
    pub const fn release_number(&self) -> &ReleaseNumber {
        &self.release_number
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
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
}
