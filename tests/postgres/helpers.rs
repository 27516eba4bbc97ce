//! Shared test helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use release_ledger::persistence::PgPool;
use rstest::fixture;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL to create the release tracking schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-18-000000_create_release_tracking/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "release_ledger_test_template";

/// Provides a [`DefaultClock`] for test fixtures.
#[fixture]
pub fn clock() -> DefaultClock {
    DefaultClock
}

/// Creates a runtime for driving the async adapters from synchronous tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn test_runtime() -> eyre::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?)
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|err| eyre::eyre!("{err}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|err| eyre::eyre!("{err}"))?;
            Ok(())
        })
        .map_err(|err| eyre::eyre!("template setup failed: {err}"))
}

/// Drops its database when the test finishes, even after a panic.
struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.db_name.as_str()) {
            tracing::warn!(database = %self.db_name, error = %err, "failed to drop test database");
        }
    }
}

/// Database cloned from the template for a single test.
///
/// The pool is declared first so its connections close before the database
/// is dropped.
pub struct TestDatabase {
    pool: PgPool,
    url: String,
    _guard: CleanupGuard,
}

impl TestDatabase {
    /// Clones the template into a fresh database named after `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if template setup, database creation or pool
    /// construction fails.
    pub fn create(cluster: &'static TestCluster, prefix: &str) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let db_name = format!("{prefix}_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
            .map_err(|err| eyre::eyre!("database {db_name} setup failed: {err}"))?;
        let guard = CleanupGuard {
            cluster,
            db_name: db_name.clone(),
        };

        let url = cluster.connection().database_url(&db_name);
        let manager = ConnectionManager::<PgConnection>::new(url.clone());
        let pool = Pool::builder().max_size(2).build(manager)?;
        Ok(Self {
            pool,
            url,
            _guard: guard,
        })
    }

    /// Returns a handle to the database's connection pool.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Opens a direct connection for assertions the adapters do not expose.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn connect(&self) -> eyre::Result<PgConnection> {
        Ok(PgConnection::establish(&self.url)?)
    }
}
