//! Manual deployment checklists and the status matrix.
//!
//! A release owns manual tasks that must be completed per deployment
//! environment before it is safe to promote. Every (release, environment)
//! and (task, environment) pair carries exactly one status row; the release
//! row for an environment is derived from the task rows beneath it.
//!
//! - Domain types and the pure rollup in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Matrix maintenance, recalculation and the request-facing service in
//!   [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
