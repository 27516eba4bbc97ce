//! In-memory adapters used by tests and local tooling.

mod release;
mod status;

pub use release::InMemoryReleaseRepository;
pub use status::InMemoryStatusRepository;
