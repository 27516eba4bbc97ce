//! Adapter implementations for the environment registry.

pub mod memory;
pub mod postgres;
