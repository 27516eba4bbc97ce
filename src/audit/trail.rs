//! Best-effort audit recording used by the application services.

use std::sync::Arc;

use mockable::Clock;
use serde_json::Value;
use uuid::Uuid;

use super::{
    domain::{AuditAction, AuditRecord, AuditRecordType},
    ports::AuditSink,
};
use crate::scope::RequestContext;

/// Writes audit records on behalf of services.
///
/// Failures are logged and swallowed.
pub struct AuditTrail<A, C>
where
    A: AuditSink,
    C: Clock + Send + Sync,
{
    sink: Arc<A>,
    clock: Arc<C>,
}

impl<A, C> Clone for AuditTrail<A, C>
where
    A: AuditSink,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<A, C> AuditTrail<A, C>
where
    A: AuditSink,
    C: Clock + Send + Sync,
{
    /// Creates an audit trail writing to `sink`.
    #[must_use]
    pub const fn new(sink: Arc<A>, clock: Arc<C>) -> Self {
        Self { sink, clock }
    }

    /// Records `action` against the entity `record_id`.
    ///
    /// Skips recording when the request has no actor.
    pub async fn record(
        &self,
        context: &RequestContext,
        record_id: Uuid,
        record_type: AuditRecordType,
        action: AuditAction,
        details: Value,
    ) {
        let Some(actor) = context.actor() else {
            tracing::warn!(
                record_id = %record_id,
                record_type = record_type.as_str(),
                action = action.as_str(),
                "no actor on request, audit entry not recorded"
            );
            return;
        };

        let record = AuditRecord {
            id: Uuid::new_v4(),
            record_id,
            record_type,
            action,
            actor: actor.to_owned(),
            tenant_id: context.tenant_id(),
            details,
            occurred_at: self.clock.utc(),
        };

        if let Err(err) = self.sink.record(record).await {
            tracing::warn!(
                error = %err,
                record_id = %record_id,
                record_type = record_type.as_str(),
                action = action.as_str(),
                "failed to record audit entry"
            );
        }
    }
}
