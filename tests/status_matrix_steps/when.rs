//! When steps for release status matrix BDD scenarios.

use super::world::{StatusMatrixWorld, run_async};
use eyre::WrapErr;
use release_ledger::release::domain::DeploymentTaskStatus;
use rstest_bdd_macros::when;

fn parse_status(status: &str) -> Result<DeploymentTaskStatus, eyre::Report> {
    status
        .parse()
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

#[when(r#"the task "{summary}" is marked "{status}" in "{environment}""#)]
fn mark_task(
    world: &mut StatusMatrixWorld,
    summary: String,
    status: String,
    environment: String,
) -> Result<(), eyre::Report> {
    let target = parse_status(&status)?;
    let environment_id = world.environment(&environment)?;
    let task = world.task(&summary)?;
    let status_id = task
        .status_in(environment_id)
        .ok_or_else(|| eyre::eyre!("task {summary} has no row in {environment}"))?
        .id();
    run_async(
        world
            .deployments
            .set_task_status(&world.context, status_id, target),
    )
    .wrap_err("set task status")?;
    Ok(())
}

#[when(r#"environment "{name}" is created"#)]
fn create_environment(world: &mut StatusMatrixWorld, name: String) -> Result<(), eyre::Report> {
    let environment = run_async(world.environments.create(&world.context, &name))
        .wrap_err("create environment")?;
    world.environment_ids.insert(name, environment.id());
    Ok(())
}

#[when(r#"the task "{summary}" is deleted"#)]
fn delete_task(world: &mut StatusMatrixWorld, summary: String) -> Result<(), eyre::Report> {
    let task = world.task(&summary)?;
    run_async(
        world
            .deployments
            .delete_task(&world.context, task.task().id()),
    )
    .wrap_err("delete task")?;
    Ok(())
}

#[when(r#"the release status in "{environment}" is overridden to "{status}""#)]
fn override_release_status(
    world: &mut StatusMatrixWorld,
    environment: String,
    status: String,
) -> Result<(), eyre::Report> {
    let target = parse_status(&status)?;
    let environment_id = world.environment(&environment)?;
    let release = run_async(
        world
            .deployments
            .find_release(&world.context, world.release()?),
    )?;
    let status_id = release
        .status_in(environment_id)
        .ok_or_else(|| eyre::eyre!("release has no row in {environment}"))?
        .id();
    run_async(
        world
            .deployments
            .set_release_status(&world.context, status_id, target),
    )
    .wrap_err("override release status")?;
    Ok(())
}
