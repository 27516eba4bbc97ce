//! In-memory audit sink for tests.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::audit::{
    domain::{AuditRecord, AuditRecordType},
    ports::{AuditSink, AuditSinkError},
};

/// Thread-safe in-memory audit sink.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError::Persistence`] when the lock is poisoned.
    pub fn records(&self) -> Result<Vec<AuditRecord>, AuditSinkError> {
        self.records
            .read()
            .map(|records| records.clone())
            .map_err(|err| AuditSinkError::persistence(std::io::Error::other(err.to_string())))
    }

    /// Returns the records of the given type in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError::Persistence`] when the lock is poisoned.
    pub fn records_of(
        &self,
        record_type: AuditRecordType,
    ) -> Result<Vec<AuditRecord>, AuditSinkError> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|record| record.record_type == record_type)
            .collect())
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        let mut records = self
            .records
            .write()
            .map_err(|err| AuditSinkError::persistence(std::io::Error::other(err.to_string())))?;
        records.push(record);
        Ok(())
    }
}
