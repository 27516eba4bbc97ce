//! Error types for release domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing release and task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReleaseDomainError {
    /// The release number is empty after trimming.
    #[error("release number must not be empty")]
    EmptyReleaseNumber,

    /// The task summary is empty after trimming.
    #[error("task summary must not be empty")]
    EmptySummary,

    /// The task component is empty after trimming.
    #[error("task component must not be empty")]
    EmptyComponent,

    /// A page request used a zero page number or page size.
    #[error("page number and page size must be positive")]
    InvalidPage,
}

/// Error returned while parsing a deployment task status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown deployment task status: {0}, expected PENDING, COMPLETE or NOT_REQUIRED")]
pub struct ParseStatusError(pub String);

/// Error returned while parsing a release stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown release stage: {0}, expected PRE, DURING or POST")]
pub struct ParseStageError(pub String);
