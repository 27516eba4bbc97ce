//! `PostgreSQL` repository for releases and their tasks.

use super::{
    models::{ReleaseRow, TaskRow},
    schema::{manual_tasks, releases},
};
use crate::{
    persistence::{PgPool, run_blocking},
    release::{
        domain::{
            PageRequest, PersistedReleaseData, PersistedTaskData, Release, ReleaseId,
            ReleaseNumber, ReleaseStage, Task, TaskDetails, TaskId,
        },
        ports::{ReleaseRepository, ReleaseRepositoryError, ReleaseRepositoryResult},
    },
    scope::TenantId,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed release and task repository.
#[derive(Debug, Clone)]
pub struct PostgresReleaseRepository {
    pool: PgPool,
}

impl PostgresReleaseRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_connection<F, T>(&self, f: F) -> ReleaseRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ReleaseRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = pool.get().map_err(ReleaseRepositoryError::persistence)?;
                f(&mut connection)
            },
            ReleaseRepositoryError::persistence,
        )
        .await
    }
}

#[async_trait]
impl ReleaseRepository for PostgresReleaseRepository {
    async fn store_release(&self, release: &Release) -> ReleaseRepositoryResult<()> {
        let release_id = release.id();
        let row = to_release_row(release);
        self.with_connection(move |connection| {
            diesel::insert_into(releases::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ReleaseRepositoryError::DuplicateRelease(release_id)
                    }
                    _ => ReleaseRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<Option<Release>> {
        self.with_connection(move |connection| {
            let row = releases::table
                .filter(releases::id.eq(id.into_inner()))
                .select(ReleaseRow::as_select())
                .first::<ReleaseRow>(connection)
                .optional()
                .map_err(ReleaseRepositoryError::persistence)?;
            row.map(row_to_release).transpose()
        })
        .await
    }

    async fn delete_release(&self, id: ReleaseId) -> ReleaseRepositoryResult<bool> {
        self.with_connection(move |connection| {
            let affected = connection
                .transaction::<_, DieselError, _>(|conn| {
                    diesel::delete(
                        manual_tasks::table.filter(manual_tasks::release_id.eq(id.into_inner())),
                    )
                    .execute(conn)?;
                    diesel::delete(releases::table.filter(releases::id.eq(id.into_inner())))
                        .execute(conn)
                })
                .map_err(ReleaseRepositoryError::persistence)?;
            Ok(affected > 0)
        })
        .await
    }

    async fn release_ids_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> ReleaseRepositoryResult<Vec<ReleaseId>> {
        self.with_connection(move |connection| {
            let ids = releases::table
                .filter(releases::tenant_id.eq(tenant_id.into_inner()))
                .order(releases::id.asc())
                .select(releases::id)
                .load::<uuid::Uuid>(connection)
                .map_err(ReleaseRepositoryError::persistence)?;
            Ok(ids.into_iter().map(ReleaseId::from_uuid).collect())
        })
        .await
    }

    async fn find_release_page(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> ReleaseRepositoryResult<Vec<Release>> {
        let offset = i64::try_from(page.offset()).map_err(ReleaseRepositoryError::persistence)?;
        let limit = i64::from(page.size());
        self.with_connection(move |connection| {
            releases::table
                .filter(releases::tenant_id.eq(tenant_id.into_inner()))
                .order((releases::release_number.desc(), releases::id.asc()))
                .offset(offset)
                .limit(limit)
                .select(ReleaseRow::as_select())
                .load::<ReleaseRow>(connection)
                .map_err(ReleaseRepositoryError::persistence)?
                .into_iter()
                .map(row_to_release)
                .collect()
        })
        .await
    }

    async fn count_releases(&self, tenant_id: TenantId) -> ReleaseRepositoryResult<u64> {
        self.with_connection(move |connection| {
            let total = releases::table
                .filter(releases::tenant_id.eq(tenant_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map_err(ReleaseRepositoryError::persistence)?;
            u64::try_from(total).map_err(ReleaseRepositoryError::persistence)
        })
        .await
    }

    async fn store_task(&self, task: &Task) -> ReleaseRepositoryResult<()> {
        let task_id = task.id();
        let release_id = task.release_id();
        let row = to_task_row(task);
        self.with_connection(move |connection| {
            diesel::insert_into(manual_tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ReleaseRepositoryError::DuplicateTask(task_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        ReleaseRepositoryError::ReleaseNotFound(release_id)
                    }
                    _ => ReleaseRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> ReleaseRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task);
        self.with_connection(move |connection| {
            let affected =
                diesel::update(manual_tasks::table.filter(manual_tasks::id.eq(row.id)))
                    .set((
                        manual_tasks::stage.eq(row.stage),
                        manual_tasks::summary.eq(row.summary),
                        manual_tasks::description.eq(row.description),
                        manual_tasks::component.eq(row.component),
                        manual_tasks::updated_at.eq(row.updated_at),
                    ))
                    .execute(connection)
                    .map_err(ReleaseRepositoryError::persistence)?;
            if affected == 0 {
                return Err(ReleaseRepositoryError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> ReleaseRepositoryResult<Option<Task>> {
        self.with_connection(move |connection| {
            let row = manual_tasks::table
                .filter(manual_tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(ReleaseRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn tasks_for_release(
        &self,
        release_id: ReleaseId,
    ) -> ReleaseRepositoryResult<Vec<Task>> {
        self.with_connection(move |connection| {
            manual_tasks::table
                .filter(manual_tasks::release_id.eq(release_id.into_inner()))
                .order((manual_tasks::created_at.asc(), manual_tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(ReleaseRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> ReleaseRepositoryResult<bool> {
        self.with_connection(move |connection| {
            let affected =
                diesel::delete(manual_tasks::table.filter(manual_tasks::id.eq(id.into_inner())))
                    .execute(connection)
                    .map_err(ReleaseRepositoryError::persistence)?;
            Ok(affected > 0)
        })
        .await
    }

    async fn task_ids_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> ReleaseRepositoryResult<Vec<TaskId>> {
        self.with_connection(move |connection| {
            let ids = manual_tasks::table
                .inner_join(releases::table)
                .filter(releases::tenant_id.eq(tenant_id.into_inner()))
                .order(manual_tasks::id.asc())
                .select(manual_tasks::id)
                .load::<uuid::Uuid>(connection)
                .map_err(ReleaseRepositoryError::persistence)?;
            Ok(ids.into_iter().map(TaskId::from_uuid).collect())
        })
        .await
    }
}

fn to_release_row(release: &Release) -> ReleaseRow {
    ReleaseRow {
        id: release.id().into_inner(),
        release_number: release.release_number().as_str().to_owned(),
        tenant_id: release.tenant_id().into_inner(),
        created_at: release.created_at(),
        updated_at: release.updated_at(),
    }
}

fn row_to_release(row: ReleaseRow) -> ReleaseRepositoryResult<Release> {
    let release_number =
        ReleaseNumber::new(row.release_number).map_err(ReleaseRepositoryError::persistence)?;
    Ok(Release::from_persisted(PersistedReleaseData {
        id: ReleaseId::from_uuid(row.id),
        release_number,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_task_row(task: &Task) -> TaskRow {
    let details = task.details();
    TaskRow {
        id: task.id().into_inner(),
        release_id: task.release_id().into_inner(),
        stage: details.stage().as_str().to_owned(),
        summary: details.summary().to_owned(),
        description: details.description().map(str::to_owned),
        component: details.component().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> ReleaseRepositoryResult<Task> {
    let stage =
        ReleaseStage::try_from(row.stage.as_str()).map_err(ReleaseRepositoryError::persistence)?;
    let details = TaskDetails::new(stage, row.summary, row.description, row.component)
        .map_err(ReleaseRepositoryError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        release_id: ReleaseId::from_uuid(row.release_id),
        details,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
