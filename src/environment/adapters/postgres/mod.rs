//! `PostgreSQL` adapters for the environment registry.

mod models;
mod repository;
mod schema;

pub use repository::PostgresEnvironmentRepository;
