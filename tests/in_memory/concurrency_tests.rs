//! Racing task status updates against the per-release lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use release_ledger::{
    audit::adapters::memory::InMemoryAuditSink,
    environment::{
        adapters::memory::InMemoryEnvironmentRepository,
        domain::{DeploymentEnvironment, EnvironmentId, EnvironmentName},
        ports::EnvironmentRepository,
    },
    release::{
        adapters::memory::{InMemoryReleaseRepository, InMemoryStatusRepository},
        domain::{
            DeploymentTaskStatus, ReleaseId, ReleaseStatus, ReleaseStatusId, TaskId, TaskStatus,
            TaskStatusId,
        },
        ports::{StatusRepository, StatusRepositoryResult},
        services::ManualDeploymentService,
    },
    scope::RequestContext,
};
use rstest::rstest;

use super::helpers::{Deployments, context, pre_task, task_status_in};

/// Status store that, once armed, schedules two concurrent task updates so
/// that an unserialised recalculation loses the later one.
///
/// The second task status write is delayed until after the first
/// recalculation has read its task rows, and the first release row read is
/// held back until the second recalculation has written its result.
#[derive(Debug, Default)]
struct InterleavingStatusRepository {
    inner: InMemoryStatusRepository,
    armed: AtomicBool,
    task_writes: AtomicUsize,
    release_reads: AtomicUsize,
}

impl InterleavingStatusRepository {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

const SECOND_WRITE_DELAY: Duration = Duration::from_millis(100);
const FIRST_READ_STALL: Duration = Duration::from_millis(300);

#[async_trait]
impl StatusRepository for InterleavingStatusRepository {
    async fn insert_release_statuses(
        &self,
        statuses: &[ReleaseStatus],
    ) -> StatusRepositoryResult<()> {
        self.inner.insert_release_statuses(statuses).await
    }

    async fn insert_task_statuses(&self, statuses: &[TaskStatus]) -> StatusRepositoryResult<()> {
        self.inner.insert_task_statuses(statuses).await
    }

    async fn find_release_statuses_by_release(
        &self,
        release_id: ReleaseId,
    ) -> StatusRepositoryResult<Vec<ReleaseStatus>> {
        if self.is_armed() && self.release_reads.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(FIRST_READ_STALL).await;
        }
        self.inner.find_release_statuses_by_release(release_id).await
    }

    async fn find_task_statuses_by_task(
        &self,
        task_id: TaskId,
    ) -> StatusRepositoryResult<Vec<TaskStatus>> {
        self.inner.find_task_statuses_by_task(task_id).await
    }

    async fn find_release_status(
        &self,
        id: ReleaseStatusId,
    ) -> StatusRepositoryResult<Option<ReleaseStatus>> {
        self.inner.find_release_status(id).await
    }

    async fn find_task_status(
        &self,
        id: TaskStatusId,
    ) -> StatusRepositoryResult<Option<TaskStatus>> {
        self.inner.find_task_status(id).await
    }

    async fn update_release_status(
        &self,
        id: ReleaseStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        self.inner.update_release_status(id, status, updated_at).await
    }

    async fn update_task_status(
        &self,
        id: TaskStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        if self.is_armed() && self.task_writes.fetch_add(1, Ordering::SeqCst) == 1 {
            tokio::time::sleep(SECOND_WRITE_DELAY).await;
        }
        self.inner.update_task_status(id, status, updated_at).await
    }

    async fn delete_release_statuses(&self, release_id: ReleaseId) -> StatusRepositoryResult<u64> {
        self.inner.delete_release_statuses(release_id).await
    }

    async fn delete_task_statuses(&self, task_id: TaskId) -> StatusRepositoryResult<u64> {
        self.inner.delete_task_statuses(task_id).await
    }

    async fn delete_statuses_for_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<u64> {
        self.inner
            .delete_statuses_for_environment(environment_id)
            .await
    }

    async fn release_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<ReleaseId>> {
        self.inner.release_ids_covering(environment_id).await
    }

    async fn task_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<TaskId>> {
        self.inner.task_ids_covering(environment_id).await
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_task_updates_do_not_lose_release_status(
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let environments = Arc::new(InMemoryEnvironmentRepository::new());
    let dev = DeploymentEnvironment::new(
        context.require_tenant()?,
        EnvironmentName::new("DEV")?,
        &DefaultClock,
    );
    environments.store(&dev).await?;
    let statuses = Arc::new(InterleavingStatusRepository::default());
    let service: Arc<Deployments<InterleavingStatusRepository>> =
        Arc::new(ManualDeploymentService::new(
            Arc::new(InMemoryReleaseRepository::new()),
            Arc::clone(&statuses),
            environments,
            Arc::new(InMemoryAuditSink::new()),
            Arc::new(DefaultClock),
        ));

    let release = service.add_release(&context, "2025.1").await?;
    let first = service
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;
    let second = service
        .add_task(&context, release.release().id(), pre_task("rotate-keys"))
        .await?;
    let first_status = task_status_in(&first, dev.id())?;
    let second_status = task_status_in(&second, dev.id())?;
    statuses.arm();

    let left_service = Arc::clone(&service);
    let left_context = context.clone();
    let left = tokio::spawn(async move {
        left_service
            .set_task_status(&left_context, first_status, DeploymentTaskStatus::Complete)
            .await
    });
    let right_service = Arc::clone(&service);
    let right_context = context.clone();
    let right = tokio::spawn(async move {
        right_service
            .set_task_status(&right_context, second_status, DeploymentTaskStatus::Complete)
            .await
    });
    left.await??;
    right.await??;

    let view = service
        .find_release(&context, release.release().id())
        .await?;
    let final_status = view.status_in(dev.id()).map(ReleaseStatus::status);
    eyre::ensure!(
        final_status == Some(DeploymentTaskStatus::Complete),
        "release should be COMPLETE once both tasks are, found {final_status:?}"
    );
    Ok(())
}
