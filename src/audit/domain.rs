//! Audit record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::scope::TenantId;

/// Kind of entity an audit record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRecordType {
    /// A release.
    Release,
    /// A manual deployment task.
    Task,
    /// A release status row.
    ReleaseStatus,
    /// A task status row.
    TaskStatus,
    /// A deployment environment.
    DeploymentEnvironment,
}

impl AuditRecordType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Task => "task",
            Self::ReleaseStatus => "release_status",
            Self::TaskStatus => "task_status",
            Self::DeploymentEnvironment => "deployment_environment",
        }
    }
}

/// Action recorded against an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The entity was created.
    Created,
    /// The entity was modified.
    Updated,
    /// The entity was removed.
    Deleted,
}

impl AuditAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Audit entry identifier.
    pub id: Uuid,
    /// Identifier of the audited entity.
    pub record_id: Uuid,
    /// Kind of the audited entity.
    pub record_type: AuditRecordType,
    /// What happened to the entity.
    pub action: AuditAction,
    /// User that performed the action.
    pub actor: String,
    /// Tenant the action was scoped to, when known.
    pub tenant_id: Option<TenantId>,
    /// Structured details, such as a status transition.
    pub details: Value,
    /// When the action was recorded.
    pub occurred_at: DateTime<Utc>,
}
