//! Port contracts for the environment registry.

pub mod repository;

pub use repository::{EnvironmentRepository, EnvironmentRepositoryError, EnvironmentRepositoryResult};
