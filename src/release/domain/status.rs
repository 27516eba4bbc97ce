//! Per-environment status values and status rows.

use super::{ParseStatusError, ReleaseId, ReleaseStatusId, TaskId, TaskStatusId};
use crate::environment::domain::EnvironmentId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

/// Completion state of a task or release in one environment.
///
/// There is no terminal state; any value may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentTaskStatus {
    /// Work is still outstanding.
    Pending,
    /// Work is done.
    Complete,
    /// The item imposes no blocking requirement for this environment.
    NotRequired,
}

impl DeploymentTaskStatus {
    /// Every status value.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Complete, Self::NotRequired];

    /// Returns the literal name used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Complete => "COMPLETE",
            Self::NotRequired => "NOT_REQUIRED",
        }
    }
}

impl TryFrom<&str> for DeploymentTaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETE" => Ok(Self::Complete),
            "NOT_REQUIRED" => Ok(Self::NotRequired),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl FromStr for DeploymentTaskStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::try_from(value)
    }
}

impl fmt::Display for DeploymentTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change applied to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    /// Value before the change.
    pub from: DeploymentTaskStatus,
    /// Value after the change.
    pub to: DeploymentTaskStatus,
}

impl StatusTransition {
    /// Returns the transition as audit details.
    #[must_use]
    pub fn to_details(self) -> Value {
        json!({ "from": self.from.as_str(), "to": self.to.as_str() })
    }
}

/// Parameter object for reconstructing a persisted status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStatusData<Id, OwnerId> {
    /// Row identifier.
    pub id: Id,
    /// Release or task the row belongs to.
    pub owner_id: OwnerId,
    /// Environment the row tracks.
    pub environment_id: EnvironmentId,
    /// Stored status value.
    pub status: DeploymentTaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Status of a release in one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStatus {
    id: ReleaseStatusId,
    release_id: ReleaseId,
    environment_id: EnvironmentId,
    status: DeploymentTaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReleaseStatus {
    /// Creates a new status row for `(release_id, environment_id)`.
    #[must_use]
    pub fn new(
        release_id: ReleaseId,
        environment_id: EnvironmentId,
        status: DeploymentTaskStatus,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ReleaseStatusId::new(),
            release_id,
            environment_id,
            status,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a status row from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedStatusData<ReleaseStatusId, ReleaseId>) -> Self {
        Self {
            id: data.id,
            release_id: data.owner_id,
            environment_id: data.environment_id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub const fn id(&self) -> ReleaseStatusId {
        self.id
    }

    /// Returns the release the row belongs to.
    #[must_use]
    pub const fn release_id(&self) -> ReleaseId {
        self.release_id
    }

    /// Returns the environment the row tracks.
    #[must_use]
    pub const fn environment_id(&self) -> EnvironmentId {
        self.environment_id
    }

    /// Returns the stored status.
    #[must_use]
    pub const fn status(&self) -> DeploymentTaskStatus {
        self.status
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

    /// Applies a new status value.
    pub const fn set_status(&mut self, status: DeploymentTaskStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

/// Status of a task in one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    id: TaskStatusId,
    task_id: TaskId,
    environment_id: EnvironmentId,
    status: DeploymentTaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskStatus {
    /// Creates a new status row for `(task_id, environment_id)`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        environment_id: EnvironmentId,
        status: DeploymentTaskStatus,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskStatusId::new(),
            task_id,
            environment_id,
            status,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a status row from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedStatusData<TaskStatusId, TaskId>) -> Self {
        Self {
            id: data.id,
            task_id: data.owner_id,
            environment_id: data.environment_id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub const fn id(&self) -> TaskStatusId {
        self.id
    }

    /// Returns the task the row belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the environment the row tracks.
    #[must_use]
    pub const fn environment_id(&self) -> EnvironmentId {
        self.environment_id
    }

    /// Returns the stored status.
    #[must_use]
    pub const fn status(&self) -> DeploymentTaskStatus {
        self.status
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

    /// Applies a new status value.
    pub const fn set_status(&mut self, status: DeploymentTaskStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}
