//! Release storage tests for the `PostgreSQL` release repository.

use crate::postgres::helpers::{TestDatabase, clock, test_runtime};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use release_ledger::{
    release::{
        adapters::postgres::PostgresReleaseRepository,
        domain::{PageRequest, Release, ReleaseNumber, ReleaseStage, Task, TaskDetails},
        ports::ReleaseRepository,
    },
    scope::TenantId,
};
use rstest::rstest;

fn numbers(releases: &[Release]) -> Vec<&str> {
    releases
        .iter()
        .map(|release| release.release_number().as_str())
        .collect()
}

#[rstest]
fn release_pages_are_ordered_by_number_descending(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "release_page")?;
    let repository = PostgresReleaseRepository::new(database.pool());
    let rt = test_runtime()?;

    let tenant_id = TenantId::new();
    for number in ["2025.1", "2025.3", "2025.2"] {
        let release = Release::new(tenant_id, ReleaseNumber::new(number)?, &clock);
        rt.block_on(repository.store_release(&release))?;
    }
    let foreign = Release::new(TenantId::new(), ReleaseNumber::new("2026.9")?, &clock);
    rt.block_on(repository.store_release(&foreign))?;

    let first = rt.block_on(repository.find_release_page(tenant_id, PageRequest::new(1, 2)?))?;
    let second = rt.block_on(repository.find_release_page(tenant_id, PageRequest::new(2, 2)?))?;
    let beyond = rt.block_on(repository.find_release_page(tenant_id, PageRequest::new(3, 2)?))?;
    let total = rt.block_on(repository.count_releases(tenant_id))?;

    eyre::ensure!(
        numbers(&first) == ["2025.3", "2025.2"],
        "first page was {:?}",
        numbers(&first)
    );
    eyre::ensure!(
        numbers(&second) == ["2025.1"],
        "second page was {:?}",
        numbers(&second)
    );
    eyre::ensure!(beyond.is_empty(), "page past the end should be empty");
    eyre::ensure!(total == 3, "expected 3 releases for the tenant, found {total}");
    Ok(())
}

#[rstest]
fn deleting_a_task_leaves_its_siblings(
    clock: DefaultClock,
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "release_tasks")?;
    let repository = PostgresReleaseRepository::new(database.pool());
    let rt = test_runtime()?;

    let release = Release::new(TenantId::new(), ReleaseNumber::new("2025.1")?, &clock);
    rt.block_on(repository.store_release(&release))?;
    let kept = Task::new(
        release.id(),
        TaskDetails::new(ReleaseStage::Pre, "upgrade-db", None, "database")?,
        &clock,
    );
    let doomed = Task::new(
        release.id(),
        TaskDetails::new(ReleaseStage::Post, "drop-column", None, "database")?,
        &clock,
    );
    rt.block_on(repository.store_task(&kept))?;
    rt.block_on(repository.store_task(&doomed))?;

    let deleted = rt.block_on(repository.delete_task(doomed.id()))?;
    let deleted_again = rt.block_on(repository.delete_task(doomed.id()))?;
    let remaining: Vec<_> = rt
        .block_on(repository.tasks_for_release(release.id()))?
        .iter()
        .map(Task::id)
        .collect();

    eyre::ensure!(deleted, "first delete should remove the task");
    eyre::ensure!(!deleted_again, "second delete should find nothing");
    eyre::ensure!(
        remaining == [kept.id()],
        "expected only the kept task, found {remaining:?}"
    );
    Ok(())
}
