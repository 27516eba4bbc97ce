//! Diesel schema for release tracking persistence.

diesel::table! {
    /// Releases per tenant.
    releases (id) {
        /// Release identifier.
        id -> Uuid,
        /// Free-form release number.
        #[max_length = 100]
        release_number -> Varchar,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Manual deployment tasks.
    manual_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning release.
        release_id -> Uuid,
        /// Rollout stage.
        #[max_length = 20]
        stage -> Varchar,
        /// One-line summary.
        #[max_length = 255]
        summary -> Varchar,
        /// Optional long description.
        description -> Nullable<Text>,
        /// Component label.
        #[max_length = 255]
        component -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Release status per environment.
    release_statuses (id) {
        /// Row identifier.
        id -> Uuid,
        /// Release the row belongs to.
        release_id -> Uuid,
        /// Environment the row tracks.
        environment_id -> Uuid,
        /// Status literal.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Task status per environment.
    task_statuses (id) {
        /// Row identifier.
        id -> Uuid,
        /// Task the row belongs to.
        task_id -> Uuid,
        /// Environment the row tracks.
        environment_id -> Uuid,
        /// Status literal.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(manual_tasks -> releases (release_id));

diesel::allow_tables_to_appear_in_same_query!(releases, manual_tasks);
