//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use release_ledger::{
    audit::adapters::memory::InMemoryAuditSink,
    environment::{
        adapters::memory::InMemoryEnvironmentRepository, domain::EnvironmentId,
        ports::EnvironmentRepository, services::EnvironmentLifecycleService,
    },
    release::{
        adapters::memory::{InMemoryReleaseRepository, InMemoryStatusRepository},
        domain::{ReleaseStage, TaskStatusId, TaskWithStatus},
        ports::{ReleaseRepository, StatusRepository},
        services::{ManualDeploymentService, TaskRequest},
    },
    scope::{RequestContext, TenantId},
};
use rstest::fixture;

/// Deployment service over in-memory adapters.
pub type Deployments<S = InMemoryStatusRepository> = ManualDeploymentService<
    InMemoryReleaseRepository,
    S,
    InMemoryEnvironmentRepository,
    InMemoryAuditSink,
    DefaultClock,
>;

/// Environment service over in-memory adapters.
pub type Environments = EnvironmentLifecycleService<
    InMemoryReleaseRepository,
    InMemoryStatusRepository,
    InMemoryEnvironmentRepository,
    InMemoryAuditSink,
    DefaultClock,
>;

/// Both services sharing one set of in-memory adapters.
pub struct Ledger {
    pub releases: Arc<InMemoryReleaseRepository>,
    pub statuses: Arc<InMemoryStatusRepository>,
    pub environment_repository: Arc<InMemoryEnvironmentRepository>,
    pub audit: Arc<InMemoryAuditSink>,
    pub deployments: Deployments,
    pub environments: Environments,
}

impl Ledger {
    /// Wires both services to fresh adapters.
    #[must_use]
    pub fn new() -> Self {
        let releases = Arc::new(InMemoryReleaseRepository::new());
        let statuses = Arc::new(InMemoryStatusRepository::new());
        let environment_repository = Arc::new(InMemoryEnvironmentRepository::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let clock = Arc::new(DefaultClock);
        let deployments = ManualDeploymentService::new(
            Arc::clone(&releases),
            Arc::clone(&statuses),
            Arc::clone(&environment_repository),
            Arc::clone(&audit),
            Arc::clone(&clock),
        );
        let environments = EnvironmentLifecycleService::new(
            Arc::clone(&releases),
            Arc::clone(&statuses),
            Arc::clone(&environment_repository),
            Arc::clone(&audit),
            clock,
        );
        Self {
            releases,
            statuses,
            environment_repository,
            audit,
            deployments,
            environments,
        }
    }

    /// Asserts that every release and task of the tenant has exactly one row
    /// per active environment.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first gap or surplus found.
    pub async fn assert_full_coverage(&self, tenant_id: TenantId) -> Result<(), eyre::Report> {
        let mut active: Vec<EnvironmentId> = self
            .environment_repository
            .active_for_tenant(tenant_id)
            .await?
            .iter()
            .map(|environment| environment.id())
            .collect();
        active.sort();

        for release_id in self.releases.release_ids_for_tenant(tenant_id).await? {
            let mut covered: Vec<EnvironmentId> = self
                .statuses
                .find_release_statuses_by_release(release_id)
                .await?
                .iter()
                .map(|row| row.environment_id())
                .filter(|environment_id| active.contains(environment_id))
                .collect();
            covered.sort();
            eyre::ensure!(
                covered == active,
                "release {release_id} covers {covered:?}, expected {active:?}"
            );
        }
        for task_id in self.releases.task_ids_for_tenant(tenant_id).await? {
            let mut covered: Vec<EnvironmentId> = self
                .statuses
                .find_task_statuses_by_task(task_id)
                .await?
                .iter()
                .map(|row| row.environment_id())
                .filter(|environment_id| active.contains(environment_id))
                .collect();
            covered.sort();
            eyre::ensure!(
                covered == active,
                "task {task_id} covers {covered:?}, expected {active:?}"
            );
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides a fresh ledger for each test.
#[fixture]
pub fn ledger() -> Ledger {
    Ledger::new()
}

/// Provides a scoped request context with an actor.
#[fixture]
pub fn context() -> RequestContext {
    RequestContext::for_tenant(TenantId::new()).with_actor("release-manager")
}

/// Builds a `PRE` task request.
#[must_use]
pub fn pre_task(summary: &str) -> TaskRequest {
    TaskRequest::new(ReleaseStage::Pre, summary, "database")
}

/// Returns the task's status row for an environment.
///
/// # Errors
///
/// Returns an error when the task has no row for the environment.
pub fn task_status_in(
    task: &TaskWithStatus,
    environment_id: EnvironmentId,
) -> Result<TaskStatusId, eyre::Report> {
    task.status_in(environment_id)
        .map(|row| row.id())
        .ok_or_else(|| eyre::eyre!("task has no status row for {environment_id}"))
}
