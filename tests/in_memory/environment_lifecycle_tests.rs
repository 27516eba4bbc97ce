//! In-memory integration tests for environment lifecycle and coverage.

use release_ledger::{
    environment::services::EnvironmentLifecycleError,
    release::domain::{DeploymentTaskStatus, ReleaseStatus},
    scope::{RequestContext, TenantId},
};
use rstest::rstest;

use super::helpers::{Ledger, context, ledger, pre_task};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn coverage_holds_across_soft_delete_and_reactivation(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let tenant_id = context.require_tenant()?;
    let dev = ledger.environments.create(&context, "DEV").await?;
    ledger.environments.create(&context, "PROD").await?;
    let release = ledger.deployments.add_release(&context, "2025.1").await?;

    ledger.environments.deactivate(&context, dev.id()).await?;
    ledger
        .deployments
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;
    ledger.deployments.add_release(&context, "2025.2").await?;
    ledger.assert_full_coverage(tenant_id).await?;

    ledger.environments.reactivate(&context, dev.id()).await?;
    ledger.assert_full_coverage(tenant_id).await?;

    let view = ledger
        .deployments
        .find_release(&context, release.release().id())
        .await?;
    eyre::ensure!(
        view.status_in(dev.id()).map(ReleaseStatus::status) == Some(DeploymentTaskStatus::Pending),
        "row kept through soft delete should be untouched"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn environments_only_backfill_their_own_tenant(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let other = RequestContext::for_tenant(TenantId::new()).with_actor("other-team");
    ledger.deployments.add_release(&other, "9.9").await?;
    ledger.deployments.add_release(&context, "2025.1").await?;

    ledger.environments.create(&context, "DEV").await?;

    eyre::ensure!(
        ledger.statuses.row_counts()? == (1, 0),
        "only the owning tenant's release should be backfilled"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hard_delete_leaves_no_dangling_rows(
    ledger: Ledger,
    context: RequestContext,
) -> Result<(), eyre::Report> {
    let tenant_id = context.require_tenant()?;
    let dev = ledger.environments.create(&context, "DEV").await?;
    let release = ledger.deployments.add_release(&context, "2025.1").await?;
    ledger
        .deployments
        .add_task(&context, release.release().id(), pre_task("upgrade-db"))
        .await?;

    ledger.environments.hard_delete(&context, dev.id()).await?;

    eyre::ensure!(
        ledger.statuses.row_counts()? == (0, 0),
        "environment rows should be gone"
    );
    ledger.assert_full_coverage(tenant_id).await?;
    let again = ledger.environments.hard_delete(&context, dev.id()).await;
    eyre::ensure!(
        matches!(again, Err(EnvironmentLifecycleError::NotFound(_))),
        "second delete should be not found, got {again:?}"
    );
    Ok(())
}
