//! Status matrix tests for the `PostgreSQL` status repository.

use crate::postgres::helpers::{TestDatabase, clock, test_runtime};
use mockable::{Clock, DefaultClock};
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use release_ledger::{
    environment::domain::EnvironmentId,
    release::{
        adapters::postgres::PostgresStatusRepository,
        domain::{
            DeploymentTaskStatus, ReleaseId, ReleaseStatus, TaskId, TaskStatus, TaskStatusId,
        },
        ports::{StatusRepository, StatusRepositoryError},
    },
};
use rstest::rstest;

#[rstest]
fn duplicate_release_status_rolls_back_the_whole_batch(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "status_release_batch")?;
    let repository = PostgresStatusRepository::new(database.pool());
    let rt = test_runtime()?;

    let release_id = ReleaseId::new();
    let taken = EnvironmentId::new();
    let fresh = EnvironmentId::new();
    let existing = ReleaseStatus::new(release_id, taken, DeploymentTaskStatus::Pending, &clock);
    rt.block_on(repository.insert_release_statuses(&[existing]))?;

    let batch = [
        ReleaseStatus::new(release_id, fresh, DeploymentTaskStatus::Pending, &clock),
        ReleaseStatus::new(release_id, taken, DeploymentTaskStatus::Pending, &clock),
    ];
    let result = rt.block_on(repository.insert_release_statuses(&batch));
    let stored: Vec<EnvironmentId> = rt
        .block_on(repository.find_release_statuses_by_release(release_id))?
        .iter()
        .map(ReleaseStatus::environment_id)
        .collect();

    eyre::ensure!(
        matches!(
            result,
            Err(StatusRepositoryError::DuplicateReleaseStatus { release_id: rejected, environment_id })
                if rejected == release_id && environment_id == taken
        ),
        "expected a duplicate for the taken environment, got {result:?}"
    );
    eyre::ensure!(
        stored == [taken],
        "the fresh row should have been rolled back, found {stored:?}"
    );
    Ok(())
}

#[rstest]
fn duplicate_task_status_rolls_back_the_whole_batch(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "status_task_batch")?;
    let repository = PostgresStatusRepository::new(database.pool());
    let rt = test_runtime()?;

    let task_id = TaskId::new();
    let environment_id = EnvironmentId::new();
    let batch = [
        TaskStatus::new(task_id, environment_id, DeploymentTaskStatus::Pending, &clock),
        TaskStatus::new(task_id, environment_id, DeploymentTaskStatus::Complete, &clock),
    ];
    let result = rt.block_on(repository.insert_task_statuses(&batch));
    let stored = rt.block_on(repository.find_task_statuses_by_task(task_id))?;

    eyre::ensure!(
        matches!(
            result,
            Err(StatusRepositoryError::DuplicateTaskStatus { task_id: rejected, .. })
                if rejected == task_id
        ),
        "expected a duplicate task status, got {result:?}"
    );
    eyre::ensure!(
        stored.is_empty(),
        "no row of the failed batch should persist, found {}",
        stored.len()
    );
    Ok(())
}

#[rstest]
fn environment_purge_removes_release_and_task_rows(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "status_purge")?;
    let repository = PostgresStatusRepository::new(database.pool());
    let rt = test_runtime()?;

    let release_id = ReleaseId::new();
    let task_id = TaskId::new();
    let purged = EnvironmentId::new();
    let kept = EnvironmentId::new();
    rt.block_on(repository.insert_release_statuses(&[
        ReleaseStatus::new(release_id, purged, DeploymentTaskStatus::Complete, &clock),
        ReleaseStatus::new(release_id, kept, DeploymentTaskStatus::Pending, &clock),
    ]))?;
    rt.block_on(repository.insert_task_statuses(&[
        TaskStatus::new(task_id, purged, DeploymentTaskStatus::Complete, &clock),
        TaskStatus::new(task_id, kept, DeploymentTaskStatus::Pending, &clock),
    ]))?;

    let removed = rt.block_on(repository.delete_statuses_for_environment(purged))?;
    let release_rows: Vec<EnvironmentId> = rt
        .block_on(repository.find_release_statuses_by_release(release_id))?
        .iter()
        .map(ReleaseStatus::environment_id)
        .collect();
    let task_rows: Vec<EnvironmentId> = rt
        .block_on(repository.find_task_statuses_by_task(task_id))?
        .iter()
        .map(TaskStatus::environment_id)
        .collect();
    let covering = rt.block_on(repository.release_ids_covering(purged))?;

    eyre::ensure!(removed == 2, "expected 2 rows purged, found {removed}");
    eyre::ensure!(release_rows == [kept], "release rows left: {release_rows:?}");
    eyre::ensure!(task_rows == [kept], "task rows left: {task_rows:?}");
    eyre::ensure!(
        covering.is_empty(),
        "no release should still cover the purged environment"
    );
    Ok(())
}

#[rstest]
fn updating_a_missing_row_affects_nothing(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "status_update")?;
    let repository = PostgresStatusRepository::new(database.pool());
    let rt = test_runtime()?;

    let affected = rt.block_on(repository.update_task_status(
        TaskStatusId::new(),
        DeploymentTaskStatus::Complete,
        clock.utc(),
    ))?;

    eyre::ensure!(affected == 0, "expected no rows updated, found {affected}");
    Ok(())
}
