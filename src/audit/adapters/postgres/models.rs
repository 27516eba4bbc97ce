//! Diesel row models for audit persistence.

use super::schema::audit_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Insert model for audit records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_records)]
pub struct NewAuditRecordRow {
    /// Audit entry identifier.
    pub id: uuid::Uuid,
    /// Identifier of the audited entity.
    pub record_id: uuid::Uuid,
    /// Kind of the audited entity.
    pub record_type: String,
    /// Action performed.
    pub action: String,
    /// Acting user.
    pub actor: String,
    /// Tenant scope of the action.
    pub tenant_id: Option<uuid::Uuid>,
    /// Structured details.
    pub details: Value,
    /// Recording timestamp.
    pub occurred_at: DateTime<Utc>,
}
