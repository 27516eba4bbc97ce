//! `PostgreSQL` adapters for releases, tasks and the status matrix.

mod models;
mod release_repository;
mod schema;
mod status_repository;

pub use release_repository::PostgresReleaseRepository;
pub use status_repository::PostgresStatusRepository;
