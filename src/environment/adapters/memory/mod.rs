//! In-memory environment registry.

mod repository;

pub use repository::InMemoryEnvironmentRepository;
