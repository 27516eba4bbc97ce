//! Step definitions for release status matrix scenarios.

pub mod given;
pub mod when;
