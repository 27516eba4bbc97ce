//! Diesel schema for deployment environments.

diesel::table! {
    /// Deployment environments per tenant.
    deployment_environments (id) {
        /// Environment identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Soft-deletion flag.
        deleted -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
