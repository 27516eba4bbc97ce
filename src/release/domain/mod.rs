//! Domain model for releases, tasks and their per-environment statuses.
//!
//! Nothing in here touches storage; [`rollup`] in particular is a pure
//! function of the current release status and the task statuses beneath it.

mod error;
mod ids;
mod release;
mod rollup;
mod status;
mod task;
mod views;

pub use error::{ParseStageError, ParseStatusError, ReleaseDomainError};
pub use ids::{ReleaseId, ReleaseStatusId, TaskId, TaskStatusId};
pub use release::{PersistedReleaseData, Release, ReleaseNumber};
pub use rollup::rollup;
pub use status::{
    DeploymentTaskStatus, PersistedStatusData, ReleaseStatus, StatusTransition, TaskStatus,
};
pub use task::{PersistedTaskData, ReleaseStage, Task, TaskDetails};
pub use views::{Page, PageRequest, ReleaseWithStatus, TaskWithStatus};
