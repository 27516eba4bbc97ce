//! Manual deployment task aggregate.

use super::{ParseStageError, ReleaseDomainError, ReleaseId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When in a rollout a task applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStage {
    /// Before the deployment starts.
    Pre,
    /// While the deployment is running.
    During,
    /// After the deployment finished.
    Post,
}

impl ReleaseStage {
    /// Every stage in rollout order.
    pub const ALL: [Self; 3] = [Self::Pre, Self::During, Self::Post];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "PRE",
            Self::During => "DURING",
            Self::Post => "POST",
        }
    }
}

impl TryFrom<&str> for ReleaseStage {
    type Error = ParseStageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "PRE" => Ok(Self::Pre),
            "DURING" => Ok(Self::During),
            "POST" => Ok(Self::Post),
            _ => Err(ParseStageError(value.to_owned())),
        }
    }
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable content of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    stage: ReleaseStage,
    summary: String,
    description: Option<String>,
    component: String,
}

impl TaskDetails {
    /// Creates validated task details.
    ///
    /// Blank descriptions are stored as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptySummary`] or
    /// [`ReleaseDomainError::EmptyComponent`] when the respective field is
    /// blank.
    pub fn new(
        stage: ReleaseStage,
        summary: impl Into<String>,
        description: Option<String>,
        component: impl Into<String>,
    ) -> Result<Self, ReleaseDomainError> {
        Ok(Self {
            stage,
            summary: non_blank(summary.into()).ok_or(ReleaseDomainError::EmptySummary)?,
            description: description.and_then(non_blank),
            component: non_blank(component.into()).ok_or(ReleaseDomainError::EmptyComponent)?,
        })
    }

    /// Returns the stage.
    #[must_use]
    pub const fn stage(&self) -> ReleaseStage {
        self.stage
    }

    /// Returns the one-line summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the long description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the component label.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// One manual step required by a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    release_id: ReleaseId,
    details: TaskDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Owning release.
    pub release_id: ReleaseId,
    /// Persisted task content.
    pub details: TaskDetails,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task under `release_id`.
    #[must_use]
    pub fn new(release_id: ReleaseId, details: TaskDetails, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            release_id,
            details,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            release_id: data.release_id,
            details: data.details,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning release.
    #[must_use]
    pub const fn release_id(&self) -> ReleaseId {
        self.release_id
    }

    /// Returns the task content.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
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

    /// Replaces the task content. Statuses are unaffected.
    pub fn edit(&mut self, details: TaskDetails, clock: &impl Clock) {
        self.details = details;
        self.updated_at = clock.utc();
    }
}
