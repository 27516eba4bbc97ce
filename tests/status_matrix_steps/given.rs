//! Given steps for release status matrix BDD scenarios.

use super::world::{StatusMatrixWorld, run_async};
use eyre::WrapErr;
use release_ledger::release::{
    domain::{DeploymentTaskStatus, ReleaseStage},
    services::TaskRequest,
};
use rstest_bdd_macros::given;

#[given(r#"environments "{first}" and "{second}""#)]
fn environments(
    world: &mut StatusMatrixWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    for name in [first, second] {
        let environment = run_async(world.environments.create(&world.context, &name))
            .wrap_err_with(|| format!("create environment {name}"))?;
        world.environment_ids.insert(name, environment.id());
    }
    Ok(())
}

#[given(r#"a release "{release_number}""#)]
fn release(world: &mut StatusMatrixWorld, release_number: String) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .deployments
            .add_release(&world.context, &release_number),
    )
    .wrap_err("create release for scenario")?;
    world.release_id = Some(created.release().id());
    Ok(())
}

#[given(r#"a "{stage}" task "{summary}" on the release"#)]
fn task_on_release(
    world: &mut StatusMatrixWorld,
    stage: String,
    summary: String,
) -> Result<(), eyre::Report> {
    let parsed_stage = ReleaseStage::try_from(stage.as_str())
        .map_err(|err| eyre::eyre!("invalid stage in scenario: {err}"))?;
    let release_id = world.release()?;
    run_async(world.deployments.add_task(
        &world.context,
        release_id,
        TaskRequest::new(parsed_stage, summary, "database"),
    ))
    .wrap_err("add task for scenario")?;
    Ok(())
}

#[given(r#"the task "{summary}" was completed in "{environment}""#)]
fn task_was_completed(
    world: &mut StatusMatrixWorld,
    summary: String,
    environment: String,
) -> Result<(), eyre::Report> {
    let environment_id = world.environment(&environment)?;
    let task = world.task(&summary)?;
    let status_id = task
        .status_in(environment_id)
        .ok_or_else(|| eyre::eyre!("task {summary} has no row in {environment}"))?
        .id();
    run_async(world.deployments.set_task_status(
        &world.context,
        status_id,
        DeploymentTaskStatus::Complete,
    ))
    .wrap_err("complete task in scenario setup")?;
    Ok(())
}
