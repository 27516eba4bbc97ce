//! Port contract for audit persistence.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::domain::AuditRecord;

/// Destination for audit records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists a single audit record.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError`] when the record cannot be stored.
    async fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError>;
}

/// Errors returned by audit sink implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditSinkError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditSinkError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
