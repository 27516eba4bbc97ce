//! Adapter implementations for the audit sink port.

pub mod memory;
pub mod postgres;
