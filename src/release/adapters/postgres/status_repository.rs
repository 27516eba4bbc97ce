//! `PostgreSQL` repository for the status matrix.
//!
//! Each batch insert runs inside one transaction: a duplicate pair rolls the
//! whole batch back.

use super::{
    models::{ReleaseStatusRow, TaskStatusRow},
    schema::{release_statuses, task_statuses},
};
use crate::{
    environment::domain::EnvironmentId,
    persistence::{PgPool, run_blocking},
    release::{
        domain::{
            DeploymentTaskStatus, PersistedStatusData, ReleaseId, ReleaseStatus, ReleaseStatusId,
            TaskId, TaskStatus, TaskStatusId,
        },
        ports::{StatusRepository, StatusRepositoryError, StatusRepositoryResult},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed status repository.
#[derive(Debug, Clone)]
pub struct PostgresStatusRepository {
    pool: PgPool,
}

impl PostgresStatusRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_connection<F, T>(&self, f: F) -> StatusRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StatusRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = pool.get().map_err(StatusRepositoryError::persistence)?;
                f(&mut connection)
            },
            StatusRepositoryError::persistence,
        )
        .await
    }
}

/// Failure of one row inside a transactional batch.
#[derive(Debug)]
enum BatchInsertError {
    Duplicate(usize),
    Query(DieselError),
}

impl From<DieselError> for BatchInsertError {
    fn from(err: DieselError) -> Self {
        Self::Query(err)
    }
}

fn insert_batch<T, F>(
    connection: &mut PgConnection,
    rows: &[T],
    insert: F,
) -> Result<(), BatchInsertError>
where
    F: Fn(&mut PgConnection, &T) -> QueryResult<usize>,
{
    connection.transaction(|conn| {
        for (index, row) in rows.iter().enumerate() {
            insert(conn, row).map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    BatchInsertError::Duplicate(index)
                }
                other => BatchInsertError::Query(other),
            })?;
        }
        Ok(())
    })
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl StatusRepository for PostgresStatusRepository {
    async fn insert_release_statuses(
        &self,
        statuses: &[ReleaseStatus],
    ) -> StatusRepositoryResult<()> {
        if statuses.is_empty() {
            return Ok(());
        }
        let rows: Vec<ReleaseStatusRow> = statuses.iter().map(to_release_status_row).collect();
        self.with_connection(move |connection| {
            insert_batch(connection, &rows, |conn, row| {
                diesel::insert_into(release_statuses::table)
                    .values(row)
                    .execute(conn)
            })
            .map_err(|err| match err {
                BatchInsertError::Duplicate(index) => rows.get(index).map_or_else(
                    || StatusRepositoryError::persistence(std::io::Error::other(
                        "duplicate release status outside batch",
                    )),
                    |row| StatusRepositoryError::DuplicateReleaseStatus {
                        release_id: ReleaseId::from_uuid(row.release_id),
                        environment_id: EnvironmentId::from_uuid(row.environment_id),
                    },
                ),
                BatchInsertError::Query(query_err) => {
                    StatusRepositoryError::persistence(query_err)
                }
            })
        })
        .await
    }

    async fn insert_task_statuses(&self, statuses: &[TaskStatus]) -> StatusRepositoryResult<()> {
        if statuses.is_empty() {
            return Ok(());
        }
        let rows: Vec<TaskStatusRow> = statuses.iter().map(to_task_status_row).collect();
        self.with_connection(move |connection| {
            insert_batch(connection, &rows, |conn, row| {
                diesel::insert_into(task_statuses::table)
                    .values(row)
                    .execute(conn)
            })
            .map_err(|err| match err {
                BatchInsertError::Duplicate(index) => rows.get(index).map_or_else(
                    || StatusRepositoryError::persistence(std::io::Error::other(
                        "duplicate task status outside batch",
                    )),
                    |row| StatusRepositoryError::DuplicateTaskStatus {
                        task_id: TaskId::from_uuid(row.task_id),
                        environment_id: EnvironmentId::from_uuid(row.environment_id),
                    },
                ),
                BatchInsertError::Query(query_err) => {
                    StatusRepositoryError::persistence(query_err)
                }
            })
        })
        .await
    }

    async fn find_release_statuses_by_release(
        &self,
        release_id: ReleaseId,
    ) -> StatusRepositoryResult<Vec<ReleaseStatus>> {
        self.with_connection(move |connection| {
            release_statuses::table
                .filter(release_statuses::release_id.eq(release_id.into_inner()))
                .order(release_statuses::environment_id.asc())
                .select(ReleaseStatusRow::as_select())
                .load::<ReleaseStatusRow>(connection)
                .map_err(StatusRepositoryError::persistence)?
                .into_iter()
                .map(row_to_release_status)
                .collect()
        })
        .await
    }

    async fn find_task_statuses_by_task(
        &self,
        task_id: TaskId,
    ) -> StatusRepositoryResult<Vec<TaskStatus>> {
        self.with_connection(move |connection| {
            task_statuses::table
                .filter(task_statuses::task_id.eq(task_id.into_inner()))
                .order(task_statuses::environment_id.asc())
                .select(TaskStatusRow::as_select())
                .load::<TaskStatusRow>(connection)
                .map_err(StatusRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task_status)
                .collect()
        })
        .await
    }

    async fn find_release_status(
        &self,
        id: ReleaseStatusId,
    ) -> StatusRepositoryResult<Option<ReleaseStatus>> {
        self.with_connection(move |connection| {
            let row = release_statuses::table
                .filter(release_statuses::id.eq(id.into_inner()))
                .select(ReleaseStatusRow::as_select())
                .first::<ReleaseStatusRow>(connection)
                .optional()
                .map_err(StatusRepositoryError::persistence)?;
            row.map(row_to_release_status).transpose()
        })
        .await
    }

    async fn find_task_status(
        &self,
        id: TaskStatusId,
    ) -> StatusRepositoryResult<Option<TaskStatus>> {
        self.with_connection(move |connection| {
            let row = task_statuses::table
                .filter(task_statuses::id.eq(id.into_inner()))
                .select(TaskStatusRow::as_select())
                .first::<TaskStatusRow>(connection)
                .optional()
                .map_err(StatusRepositoryError::persistence)?;
            row.map(row_to_task_status).transpose()
        })
        .await
    }

    async fn update_release_status(
        &self,
        id: ReleaseStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        self.with_connection(move |connection| {
            let rows = diesel::update(
                release_statuses::table.filter(release_statuses::id.eq(id.into_inner())),
            )
            .set((
                release_statuses::status.eq(status.as_str()),
                release_statuses::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(StatusRepositoryError::persistence)?;
            Ok(affected(rows))
        })
        .await
    }

    async fn update_task_status(
        &self,
        id: TaskStatusId,
        status: DeploymentTaskStatus,
        updated_at: DateTime<Utc>,
    ) -> StatusRepositoryResult<u64> {
        self.with_connection(move |connection| {
            let rows =
                diesel::update(task_statuses::table.filter(task_statuses::id.eq(id.into_inner())))
                    .set((
                        task_statuses::status.eq(status.as_str()),
                        task_statuses::updated_at.eq(updated_at),
                    ))
                    .execute(connection)
                    .map_err(StatusRepositoryError::persistence)?;
            Ok(affected(rows))
        })
        .await
    }

    async fn delete_release_statuses(&self, release_id: ReleaseId) -> StatusRepositoryResult<u64> {
        self.with_connection(move |connection| {
            let rows = diesel::delete(
                release_statuses::table
                    .filter(release_statuses::release_id.eq(release_id.into_inner())),
            )
            .execute(connection)
            .map_err(StatusRepositoryError::persistence)?;
            Ok(affected(rows))
        })
        .await
    }

    async fn delete_task_statuses(&self, task_id: TaskId) -> StatusRepositoryResult<u64> {
        self.with_connection(move |connection| {
            let rows = diesel::delete(
                task_statuses::table.filter(task_statuses::task_id.eq(task_id.into_inner())),
            )
            .execute(connection)
            .map_err(StatusRepositoryError::persistence)?;
            Ok(affected(rows))
        })
        .await
    }

    async fn delete_statuses_for_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<u64> {
        let environment = environment_id.into_inner();
        self.with_connection(move |connection| {
            let rows = connection
                .transaction::<_, DieselError, _>(|conn| {
                    let tasks = diesel::delete(
                        task_statuses::table
                            .filter(task_statuses::environment_id.eq(environment)),
                    )
                    .execute(conn)?;
                    let releases = diesel::delete(
                        release_statuses::table
                            .filter(release_statuses::environment_id.eq(environment)),
                    )
                    .execute(conn)?;
                    Ok(tasks + releases)
                })
                .map_err(StatusRepositoryError::persistence)?;
            Ok(affected(rows))
        })
        .await
    }

    async fn release_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<ReleaseId>> {
        self.with_connection(move |connection| {
            let ids = release_statuses::table
                .filter(release_statuses::environment_id.eq(environment_id.into_inner()))
                .select(release_statuses::release_id)
                .distinct()
                .load::<uuid::Uuid>(connection)
                .map_err(StatusRepositoryError::persistence)?;
            Ok(ids.into_iter().map(ReleaseId::from_uuid).collect())
        })
        .await
    }

    async fn task_ids_covering(
        &self,
        environment_id: EnvironmentId,
    ) -> StatusRepositoryResult<Vec<TaskId>> {
        self.with_connection(move |connection| {
            let ids = task_statuses::table
                .filter(task_statuses::environment_id.eq(environment_id.into_inner()))
                .select(task_statuses::task_id)
                .distinct()
                .load::<uuid::Uuid>(connection)
                .map_err(StatusRepositoryError::persistence)?;
            Ok(ids.into_iter().map(TaskId::from_uuid).collect())
        })
        .await
    }
}

fn to_release_status_row(status: &ReleaseStatus) -> ReleaseStatusRow {
    ReleaseStatusRow {
        id: status.id().into_inner(),
        release_id: status.release_id().into_inner(),
        environment_id: status.environment_id().into_inner(),
        status: status.status().as_str().to_owned(),
        created_at: status.created_at(),
        updated_at: status.updated_at(),
    }
}

fn to_task_status_row(status: &TaskStatus) -> TaskStatusRow {
    TaskStatusRow {
        id: status.id().into_inner(),
        task_id: status.task_id().into_inner(),
        environment_id: status.environment_id().into_inner(),
        status: status.status().as_str().to_owned(),
        created_at: status.created_at(),
        updated_at: status.updated_at(),
    }
}

fn row_to_release_status(row: ReleaseStatusRow) -> StatusRepositoryResult<ReleaseStatus> {
    let status = DeploymentTaskStatus::try_from(row.status.as_str())
        .map_err(StatusRepositoryError::persistence)?;
    Ok(ReleaseStatus::from_persisted(PersistedStatusData {
        id: ReleaseStatusId::from_uuid(row.id),
        owner_id: ReleaseId::from_uuid(row.release_id),
        environment_id: EnvironmentId::from_uuid(row.environment_id),
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_task_status(row: TaskStatusRow) -> StatusRepositoryResult<TaskStatus> {
    let status = DeploymentTaskStatus::try_from(row.status.as_str())
        .map_err(StatusRepositoryError::persistence)?;
    Ok(TaskStatus::from_persisted(PersistedStatusData {
        id: TaskStatusId::from_uuid(row.id),
        owner_id: TaskId::from_uuid(row.task_id),
        environment_id: EnvironmentId::from_uuid(row.environment_id),
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
