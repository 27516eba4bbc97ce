//! `PostgreSQL` repository implementation for deployment environments.

use super::{
    models::{EnvironmentRow, NewEnvironmentRow},
    schema::deployment_environments,
};
use crate::{
    environment::{
        domain::{DeploymentEnvironment, EnvironmentId, EnvironmentName, PersistedEnvironmentData},
        ports::{EnvironmentRepository, EnvironmentRepositoryError, EnvironmentRepositoryResult},
    },
    persistence::{PgPool, run_blocking},
    scope::TenantId,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed environment repository.
#[derive(Debug, Clone)]
pub struct PostgresEnvironmentRepository {
    pool: PgPool,
}

impl PostgresEnvironmentRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_connection<F, T>(&self, f: F) -> EnvironmentRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> EnvironmentRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = pool.get().map_err(EnvironmentRepositoryError::persistence)?;
                f(&mut connection)
            },
            EnvironmentRepositoryError::persistence,
        )
        .await
    }
}

#[async_trait]
impl EnvironmentRepository for PostgresEnvironmentRepository {
    async fn store(&self, environment: &DeploymentEnvironment) -> EnvironmentRepositoryResult<()> {
        let environment_id = environment.id();
        let row = to_new_row(environment);
        self.with_connection(move |connection| {
            diesel::insert_into(deployment_environments::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        EnvironmentRepositoryError::DuplicateEnvironment(environment_id)
                    }
                    _ => EnvironmentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        environment: &DeploymentEnvironment,
    ) -> EnvironmentRepositoryResult<()> {
        let environment_id = environment.id();
        let name = environment.name().as_str().to_owned();
        let deleted = !environment.is_active();
        let updated_at = environment.updated_at();
        self.with_connection(move |connection| {
            let affected = diesel::update(
                deployment_environments::table
                    .filter(deployment_environments::id.eq(environment_id.into_inner())),
            )
            .set((
                deployment_environments::name.eq(name),
                deployment_environments::deleted.eq(deleted),
                deployment_environments::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(EnvironmentRepositoryError::persistence)?;
            if affected == 0 {
                return Err(EnvironmentRepositoryError::NotFound(environment_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: EnvironmentId,
    ) -> EnvironmentRepositoryResult<Option<DeploymentEnvironment>> {
        self.with_connection(move |connection| {
            let row = deployment_environments::table
                .filter(deployment_environments::id.eq(id.into_inner()))
                .select(EnvironmentRow::as_select())
                .first::<EnvironmentRow>(connection)
                .optional()
                .map_err(EnvironmentRepositoryError::persistence)?;
            row.map(row_to_environment).transpose()
        })
        .await
    }

    async fn active_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> EnvironmentRepositoryResult<Vec<DeploymentEnvironment>> {
        self.with_connection(move |connection| {
            deployment_environments::table
                .filter(deployment_environments::tenant_id.eq(tenant_id.into_inner()))
                .filter(deployment_environments::deleted.eq(false))
                .order(deployment_environments::name.asc())
                .select(EnvironmentRow::as_select())
                .load::<EnvironmentRow>(connection)
                .map_err(EnvironmentRepositoryError::persistence)?
                .into_iter()
                .map(row_to_environment)
                .collect()
        })
        .await
    }

    async fn hard_delete(&self, id: EnvironmentId) -> EnvironmentRepositoryResult<bool> {
        self.with_connection(move |connection| {
            let affected = diesel::delete(
                deployment_environments::table
                    .filter(deployment_environments::id.eq(id.into_inner())),
            )
            .execute(connection)
            .map_err(EnvironmentRepositoryError::persistence)?;
            Ok(affected > 0)
        })
        .await
    }
}

fn to_new_row(environment: &DeploymentEnvironment) -> NewEnvironmentRow {
    NewEnvironmentRow {
        id: environment.id().into_inner(),
        name: environment.name().as_str().to_owned(),
        tenant_id: environment.tenant_id().into_inner(),
        deleted: !environment.is_active(),
        created_at: environment.created_at(),
        updated_at: environment.updated_at(),
    }
}

fn row_to_environment(row: EnvironmentRow) -> EnvironmentRepositoryResult<DeploymentEnvironment> {
    let name = EnvironmentName::new(row.name).map_err(EnvironmentRepositoryError::persistence)?;
    Ok(DeploymentEnvironment::from_persisted(
        PersistedEnvironmentData {
            id: EnvironmentId::from_uuid(row.id),
            name,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
    ))
}
