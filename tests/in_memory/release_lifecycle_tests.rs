//! In-memory integration tests for release and task operations.

use release_ledger::{
    audit::domain::{AuditAction, AuditRecordType},
    release::domain::{DeploymentTaskStatus, ReleaseStatus},
    scope::RequestContext,
};
use rstest::rstest;
use uuid::Uuid;

use super::helpers::{Ledger, context, ledger, pre_task, task_status_in};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn coverage_holds_through_release_and_task_churn(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let tenant_id = context.require_tenant()?;
    ledger.environments.create(&context, "DEV").await?;
    ledger.environments.create(&context, "PROD").await?;

    let first = ledger.deployments.add_release(&context, "2025.1").await?;
    ledger
        .deployments
        .add_task(&context, first.release().id(), pre_task("upgrade-db"))
        .await?;
    let doomed = ledger
        .deployments
        .add_task(&context, first.release().id(), pre_task("drop-column"))
        .await?;
    ledger.assert_full_coverage(tenant_id).await?;

    ledger.environments.create(&context, "STAGING").await?;
    let second = ledger.deployments.add_release(&context, "2025.2").await?;
    ledger
        .deployments
        .add_task(&context, second.release().id(), pre_task("warm-cache"))
        .await?;
    ledger.assert_full_coverage(tenant_id).await?;

    ledger
        .deployments
        .delete_task(&context, doomed.task().id())
        .await?;
    ledger
        .deployments
        .delete_release(&context, second.release().id())
        .await?;
    ledger.assert_full_coverage(tenant_id).await?;
    eyre::ensure!(
        ledger.statuses.row_counts()? == (3, 3),
        "unexpected row counts {:?}",
        ledger.statuses.row_counts()?
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_status_change_only_moves_its_environment(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let dev = ledger.environments.create(&context, "DEV").await?;
    let prod = ledger.environments.create(&context, "PROD").await?;
    let release = ledger.deployments.add_release(&context, "2025.1").await?;
    let task = ledger
        .deployments
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;

    let update = ledger
        .deployments
        .set_task_status(
            &context,
            task_status_in(&task, dev.id())?,
            DeploymentTaskStatus::Complete,
        )
        .await?;

    eyre::ensure!(update.release_changes.len() == 1, "expected one change");
    let view = ledger
        .deployments
        .find_release(&context, release.release().id())
        .await?;
    eyre::ensure!(
        view.status_in(dev.id()).map(ReleaseStatus::status) == Some(DeploymentTaskStatus::Complete),
        "DEV should be COMPLETE"
    );
    eyre::ensure!(
        view.status_in(prod.id()).map(ReleaseStatus::status) == Some(DeploymentTaskStatus::Pending),
        "PROD should stay PENDING"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_literals_drive_the_service(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let dev = ledger.environments.create(&context, "DEV").await?;
    let release = ledger.deployments.add_release(&context, "2025.1").await?;
    let task = ledger
        .deployments
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;

    let status = "NOT_REQUIRED".parse()?;
    let update = ledger
        .deployments
        .set_task_status(&context, task_status_in(&task, dev.id())?, status)
        .await?;

    eyre::ensure!(
        update.status.status().as_str() == "NOT_REQUIRED",
        "status literal should round trip"
    );
    eyre::ensure!(
        "not_required".parse::<DeploymentTaskStatus>().is_err(),
        "status literals are case sensitive"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_is_audited(ledger: Ledger, context: RequestContext) -> Result<(), eyre::Report> {
    ledger.environments.create(&context, "DEV").await?;
    ledger.environments.create(&context, "PROD").await?;
    let release = ledger.deployments.add_release(&context, "2025.1").await?;
    let task = ledger
        .deployments
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;

    let mut created_release_rows: Vec<Uuid> = ledger
        .audit
        .records_of(AuditRecordType::ReleaseStatus)?
        .iter()
        .filter(|record| record.action == AuditAction::Created)
        .map(|record| record.record_id)
        .collect();
    created_release_rows.sort();
    let mut release_rows: Vec<Uuid> = release
        .environment_status()
        .values()
        .map(|row| row.id().into_inner())
        .collect();
    release_rows.sort();
    eyre::ensure!(
        release_rows.len() == 2 && created_release_rows == release_rows,
        "every release status row should be audited as created, got {created_release_rows:?}"
    );
    let mut created_task_rows: Vec<Uuid> = ledger
        .audit
        .records_of(AuditRecordType::TaskStatus)?
        .iter()
        .filter(|record| record.action == AuditAction::Created)
        .map(|record| record.record_id)
        .collect();
    created_task_rows.sort();
    let mut task_rows: Vec<Uuid> = task
        .environment_status()
        .values()
        .map(|row| row.id().into_inner())
        .collect();
    task_rows.sort();
    eyre::ensure!(
        task_rows.len() == 2 && created_task_rows == task_rows,
        "every task status row should be audited as created, got {created_task_rows:?}"
    );
    ledger
        .deployments
        .delete_task(&context, task.task().id())
        .await?;

    let task_actions: Vec<AuditAction> = ledger
        .audit
        .records_of(AuditRecordType::Task)?
        .iter()
        .map(|record| record.action)
        .collect();
    eyre::ensure!(
        task_actions == [AuditAction::Created, AuditAction::Deleted],
        "unexpected task audit trail {task_actions:?}"
    );
    let tenant_ids_match = ledger
        .audit
        .records()?
        .iter()
        .all(|record| record.tenant_id == context.tenant_id());
    eyre::ensure!(tenant_ids_match, "audit records must carry the tenant");
    Ok(())
}
