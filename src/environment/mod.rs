//! Deployment environment registry and lifecycle.
//!
//! Environments are the columns of the status matrix. Creating one backfills
//! `NOT_REQUIRED` status rows for every existing release and task of the
//! tenant; hard-deleting one removes every status row that references it.
//! Soft deletion hides an environment while keeping its status history.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
