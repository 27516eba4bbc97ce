//! Diesel schema for the audit trail.

diesel::table! {
    /// Audit trail entries.
    audit_records (id) {
        /// Audit entry identifier.
        id -> Uuid,
        /// Identifier of the audited entity.
        record_id -> Uuid,
        /// Kind of the audited entity.
        #[max_length = 50]
        record_type -> Varchar,
        /// Action performed.
        #[max_length = 20]
        action -> Varchar,
        /// Acting user.
        #[max_length = 255]
        actor -> Varchar,
        /// Tenant scope of the action.
        tenant_id -> Nullable<Uuid>,
        /// Structured details.
        details -> Jsonb,
        /// Recording timestamp.
        occurred_at -> Timestamptz,
    }
}
