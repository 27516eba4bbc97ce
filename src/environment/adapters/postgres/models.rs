//! Diesel row models for environment persistence.

use super::schema::deployment_environments;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for environments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deployment_environments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnvironmentRow {
    /// Environment identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Soft-deletion flag.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for environments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deployment_environments)]
pub struct NewEnvironmentRow {
    /// Environment identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Soft-deletion flag.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
