//! Release ledger: manual deployment task tracking for release rollouts.
//!
//! This crate records releases, the manual tasks each release needs, and the
//! deployment environments they roll out to. It keeps a status row for every
//! (release, environment) and (task, environment) pair and derives each
//! release's status from the statuses of its tasks.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and auditing
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Tenant-scoped operations composed from the ports
//!
//! # Modules
//!
//! - [`release`]: Releases, tasks, the status matrix and rollups
//! - [`environment`]: Deployment environment registry
//! - [`audit`]: Audit trail for changes
//! - [`scope`]: Per-request tenant and actor context
//! - [`config`], [`observability`], [`persistence`]: Process wiring

pub mod audit;
pub mod config;
pub mod environment;
pub mod observability;
pub mod persistence;
pub mod release;
pub mod scope;
