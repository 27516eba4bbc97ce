//! Domain model for deployment environments.

mod environment;
mod error;
mod ids;

pub use environment::{DeploymentEnvironment, EnvironmentName, PersistedEnvironmentData};
pub use error::EnvironmentDomainError;
pub use ids::EnvironmentId;
