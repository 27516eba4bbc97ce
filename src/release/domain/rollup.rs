//! Aggregation of task statuses into a release status.

use super::DeploymentTaskStatus;

/// Computes a release's status in one environment from the statuses of its
/// tasks in that environment.
///
/// Rules are applied in order:
///
/// 1. no tasks: `current` is kept (a manual override or the creation
///    default survives);
/// 2. every task `COMPLETE`: `COMPLETE`;
/// 3. every task `NOT_REQUIRED`: `NOT_REQUIRED`;
/// 4. any task `PENDING`: `PENDING`;
/// 5. otherwise, a mix of `COMPLETE` and `NOT_REQUIRED`: `COMPLETE`.
///
/// The result depends only on which values occur, not on their order or
/// multiplicity.
///
/// # Examples
///
/// ```
/// use release_ledger::release::domain::{DeploymentTaskStatus::*, rollup};
///
/// assert_eq!(rollup(Pending, []), Pending);
/// assert_eq!(rollup(Pending, [Complete, NotRequired]), Complete);
/// assert_eq!(rollup(Complete, [Complete, Pending]), Pending);
/// ```
#[must_use]
pub fn rollup(
    current: DeploymentTaskStatus,
    task_statuses: impl IntoIterator<Item = DeploymentTaskStatus>,
) -> DeploymentTaskStatus {
    let mut seen = Seen::default();
    for status in task_statuses {
        seen.observe(status);
    }

    if seen.is_empty() {
        return current;
    }
    if seen.only(DeploymentTaskStatus::Complete) {
        return DeploymentTaskStatus::Complete;
    }
    if seen.only(DeploymentTaskStatus::NotRequired) {
        return DeploymentTaskStatus::NotRequired;
    }
    if seen.pending {
        return DeploymentTaskStatus::Pending;
    }
    DeploymentTaskStatus::Complete
}

/// Which status values occurred.
#[derive(Debug, Default, Clone, Copy)]
struct Seen {
    pending: bool,
    complete: bool,
    not_required: bool,
}

impl Seen {
    const fn observe(&mut self, status: DeploymentTaskStatus) {
        match status {
            DeploymentTaskStatus::Pending => self.pending = true,
            DeploymentTaskStatus::Complete => self.complete = true,
            DeploymentTaskStatus::NotRequired => self.not_required = true,
        }
    }

    const fn is_empty(self) -> bool {
        !(self.pending || self.complete || self.not_required)
    }

    const fn only(self, status: DeploymentTaskStatus) -> bool {
        match status {
            DeploymentTaskStatus::Pending => self.pending && !self.complete && !self.not_required,
            DeploymentTaskStatus::Complete => self.complete && !self.pending && !self.not_required,
            DeploymentTaskStatus::NotRequired => {
                self.not_required && !self.pending && !self.complete
            }
        }
    }
}
