//! Diesel row models for release tracking persistence.

use super::schema::{manual_tasks, release_statuses, releases, task_statuses};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Stored release row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = releases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReleaseRow {
    /// Release identifier.
    pub id: uuid::Uuid,
    /// Free-form release number.
    pub release_number: String,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Stored task row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = manual_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning release.
    pub release_id: uuid::Uuid,
    /// Rollout stage literal.
    pub stage: String,
    /// One-line summary.
    pub summary: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Component label.
    pub component: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Stored release status row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = release_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReleaseStatusRow {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Release the row belongs to.
    pub release_id: uuid::Uuid,
    /// Environment the row tracks.
    pub environment_id: uuid::Uuid,
    /// Status literal.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Stored task status row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskStatusRow {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Task the row belongs to.
    pub task_id: uuid::Uuid,
    /// Environment the row tracks.
    pub environment_id: uuid::Uuid,
    /// Status literal.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
