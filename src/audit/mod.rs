//! Audit trail for release-tracking changes.
//!
//! Every creation, deletion and status transition is recorded through the
//! [`ports::AuditSink`] port. Recording is best effort: [`AuditTrail`] logs
//! sink failures and never hands them back to the caller, so a missing audit
//! entry cannot undo a committed write.

pub mod adapters;
pub mod domain;
pub mod ports;
mod trail;

pub use trail::AuditTrail;
