//! Error types for environment validation.

use thiserror::Error;

/// Errors returned while constructing environment values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvironmentDomainError {
    /// The environment name is empty after trimming.
    #[error("environment name must not be empty")]
    EmptyName,
}
