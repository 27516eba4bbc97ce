//! Port contracts for releases, tasks and the status matrix.
//!
//! Services consume these traits only, so a transactional status store can
//! replace the default one without changing the services' call sequence.

pub mod release_repository;
pub mod status_repository;

pub use release_repository::{ReleaseRepository, ReleaseRepositoryError, ReleaseRepositoryResult};
pub use status_repository::{StatusRepository, StatusRepositoryError, StatusRepositoryResult};
