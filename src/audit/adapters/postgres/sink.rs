//! `PostgreSQL` implementation of [`AuditSink`].

use super::{models::NewAuditRecordRow, schema::audit_records};
use crate::{
    audit::{
        domain::AuditRecord,
        ports::{AuditSink, AuditSinkError},
    },
    persistence::{PgPool, run_blocking},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed audit sink.
#[derive(Debug, Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    /// Creates a sink from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        let pool = self.pool.clone();
        let row = to_new_row(record);
        run_blocking(
            move || {
                let mut connection = pool.get().map_err(AuditSinkError::persistence)?;
                diesel::insert_into(audit_records::table)
                    .values(&row)
                    .execute(&mut connection)
                    .map_err(AuditSinkError::persistence)?;
                Ok(())
            },
            AuditSinkError::persistence,
        )
        .await
    }
}

fn to_new_row(record: AuditRecord) -> NewAuditRecordRow {
    NewAuditRecordRow {
        id: record.id,
        record_id: record.record_id,
        record_type: record.record_type.as_str().to_owned(),
        action: record.action.as_str().to_owned(),
        actor: record.actor,
        tenant_id: record.tenant_id.map(crate::scope::TenantId::into_inner),
        details: record.details,
        occurred_at: record.occurred_at,
    }
}
