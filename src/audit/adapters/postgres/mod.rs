//! `PostgreSQL` audit sink.

mod models;
mod schema;
mod sink;

pub use sink::PostgresAuditSink;
