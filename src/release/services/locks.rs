//! Per-release serialisation of status writes and recalculations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::release::domain::ReleaseId;

/// Async mutexes keyed by release.
///
/// A guard is held across the task status write and the read-compute-write
/// recalculation that follows it, so two updates for the same release cannot
/// interleave. Releases never block each other.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLocks {
    locks: Arc<Mutex<HashMap<ReleaseId, Arc<AsyncMutex<()>>>>>,
}

impl ReleaseLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `release_id`.
    pub async fn acquire(&self, release_id: ReleaseId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(release_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops the entry of a deleted release.
    pub fn forget(&self, release_id: ReleaseId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(&release_id);
    }

    /// Returns the number of releases with a lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` when no release has a lock entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
