//! Read models combining releases and tasks with their status rows.

use super::{Release, ReleaseDomainError, ReleaseStatus, Task, TaskStatus};
use crate::environment::domain::EnvironmentId;
use serde::Serialize;
use std::collections::BTreeMap;

/// A release together with its status row for each environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseWithStatus {
    release: Release,
    environment_status: BTreeMap<EnvironmentId, ReleaseStatus>,
}

impl ReleaseWithStatus {
    /// Combines a release with its status rows.
    #[must_use]
    pub fn new(release: Release, statuses: impl IntoIterator<Item = ReleaseStatus>) -> Self {
        let environment_status = statuses
            .into_iter()
            .map(|status| (status.environment_id(), status))
            .collect();
        Self {
            release,
            environment_status,
        }
    }

    /// Returns the release.
    #[must_use]
    pub const fn release(&self) -> &Release {
        &self.release
    }

    /// Returns the status rows keyed by environment.
    #[must_use]
    pub const fn environment_status(&self) -> &BTreeMap<EnvironmentId, ReleaseStatus> {
        &self.environment_status
    }

    /// Returns the status row for `environment_id`, if one exists.
    #[must_use]
    pub fn status_in(&self, environment_id: EnvironmentId) -> Option<&ReleaseStatus> {
        self.environment_status.get(&environment_id)
    }
}

/// A task together with its status row for each environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskWithStatus {
    task: Task,
    environment_status: BTreeMap<EnvironmentId, TaskStatus>,
}

impl TaskWithStatus {
    /// Combines a task with its status rows.
    #[must_use]
    pub fn new(task: Task, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        let environment_status = statuses
            .into_iter()
            .map(|status| (status.environment_id(), status))
            .collect();
        Self {
            task,
            environment_status,
        }
    }

    /// Returns the task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the status rows keyed by environment.
    #[must_use]
    pub const fn environment_status(&self) -> &BTreeMap<EnvironmentId, TaskStatus> {
        &self.environment_status
    }

    /// Returns the status row for `environment_id`, if one exists.
    #[must_use]
    pub fn status_in(&self, environment_id: EnvironmentId) -> Option<&TaskStatus> {
        self.environment_status.get(&environment_id)
    }
}

/// One-based page selection for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidPage`] when either value is zero.
    pub const fn new(number: u32, size: u32) -> Result<Self, ReleaseDomainError> {
        if number == 0 || size == 0 {
            return Err(ReleaseDomainError::InvalidPage);
        }
        Ok(Self { number, size })
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Returns the page size.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub fn offset(self) -> u64 {
        (u64::from(self.number) - 1) * u64::from(self.size)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// One-based page number.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
    /// Number of rows across all pages.
    pub total_elements: u64,
    /// Rows on this page.
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Returns the number of pages needed for `total_elements`.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.size.max(1)))
    }
}
