//! Shared `PostgreSQL` plumbing for the Diesel adapters.
//!
//! Diesel is synchronous, so every adapter runs its queries through
//! [`run_blocking`] to keep the async executor's worker threads free.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

use crate::config::{AppConfig, ConfigError};
use thiserror::Error;

/// `PostgreSQL` connection pool shared by all adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Errors raised while building the connection pool.
#[derive(Debug, Error)]
pub enum PoolSetupError {
    /// Configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The pool could not establish its initial connections.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Builds a connection pool from configuration.
///
/// # Errors
///
/// Returns [`PoolSetupError::Config`] when no database URL is configured and
/// [`PoolSetupError::Pool`] when connections cannot be established.
pub fn build_pool(config: &AppConfig) -> Result<PgPool, PoolSetupError> {
    let manager = ConnectionManager::<PgConnection>::new(config.require_database_url()?);
    let pool = Pool::builder().max_size(config.pool_size).build(manager)?;
    Ok(pool)
}

/// Runs a blocking database operation on the blocking thread pool, mapping a
/// join failure into the caller's error type.
pub(crate) async fn run_blocking<F, T, E, M>(f: F, map_join_err: M) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: FnOnce(tokio::task::JoinError) -> E,
{
    tokio::task::spawn_blocking(f).await.map_err(map_join_err)?
}
