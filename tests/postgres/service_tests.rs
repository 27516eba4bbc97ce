//! The deployment service wired to every `PostgreSQL` adapter.

use std::sync::Arc;

use crate::postgres::helpers::{TestDatabase, test_runtime};
use diesel::prelude::*;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use release_ledger::{
    audit::adapters::postgres::PostgresAuditSink,
    environment::{
        adapters::postgres::PostgresEnvironmentRepository, services::EnvironmentLifecycleService,
    },
    release::{
        adapters::postgres::{PostgresReleaseRepository, PostgresStatusRepository},
        domain::{DeploymentTaskStatus, ReleaseStage, ReleaseStatus, TaskStatus},
        services::{ManualDeploymentService, TaskRequest},
    },
    scope::{RequestContext, TenantId},
};
use rstest::rstest;

#[derive(diesel::QueryableByName, Debug)]
struct AuditEntry {
    #[diesel(sql_type = diesel::sql_types::Text)]
    record_type: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    action: String,
}

#[rstest]
fn task_completion_rolls_up_through_postgres(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "service_rollup")?;
    let pool = database.pool();
    let releases = Arc::new(PostgresReleaseRepository::new(pool.clone()));
    let statuses = Arc::new(PostgresStatusRepository::new(pool.clone()));
    let environment_repository = Arc::new(PostgresEnvironmentRepository::new(pool.clone()));
    let audit = Arc::new(PostgresAuditSink::new(pool));
    let clock = Arc::new(DefaultClock);
    let deployments = ManualDeploymentService::new(
        Arc::clone(&releases),
        Arc::clone(&statuses),
        Arc::clone(&environment_repository),
        Arc::clone(&audit),
        Arc::clone(&clock),
    );
    let environments = EnvironmentLifecycleService::new(
        releases,
        statuses,
        environment_repository,
        audit,
        clock,
    );
    let context = RequestContext::for_tenant(TenantId::new()).with_actor("release-manager");
    let rt = test_runtime()?;

    let (release_status_id, final_status) = rt.block_on(async {
        let dev = environments.create(&context, "DEV").await?;
        let release = deployments.add_release(&context, "2025.1").await?;
        let task = deployments
            .add_task(
                &context,
                release.release().id(),
                TaskRequest::new(ReleaseStage::Pre, "upgrade-db", "database"),
            )
            .await?;
        let task_status_id = task
            .status_in(dev.id())
            .map(TaskStatus::id)
            .ok_or_else(|| eyre::eyre!("task has no DEV row"))?;
        let release_status_id = release
            .status_in(dev.id())
            .map(ReleaseStatus::id)
            .ok_or_else(|| eyre::eyre!("release has no DEV row"))?;

        let update = deployments
            .set_task_status(&context, task_status_id, DeploymentTaskStatus::Complete)
            .await?;
        eyre::ensure!(
            update.release_changes.len() == 1,
            "expected one release change, found {}",
            update.release_changes.len()
        );
        let view = deployments
            .find_release(&context, release.release().id())
            .await?;
        let status = view.status_in(dev.id()).map(ReleaseStatus::status);
        Ok::<_, eyre::Report>((release_status_id, status))
    })?;
    eyre::ensure!(
        final_status == Some(DeploymentTaskStatus::Complete),
        "release should be COMPLETE, found {final_status:?}"
    );

    let mut connection = database.connect()?;
    let mut entries: Vec<(String, String)> = diesel::sql_query(
        "SELECT record_type, action FROM audit_records WHERE record_id = $1",
    )
    .bind::<diesel::sql_types::Uuid, _>(release_status_id.into_inner())
    .load::<AuditEntry>(&mut connection)?
    .into_iter()
    .map(|entry| (entry.record_type, entry.action))
    .collect();
    entries.sort();
    eyre::ensure!(
        entries
            == [
                ("release_status".to_owned(), "created".to_owned()),
                ("release_status".to_owned(), "updated".to_owned()),
            ],
        "unexpected audit trail for the release status: {entries:?}"
    );
    Ok(())
}
