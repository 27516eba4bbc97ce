//! Adapter implementations for release and status ports.

pub mod memory;
pub mod postgres;
