//! Application services for the environment registry.

mod lifecycle;

pub use lifecycle::{EnvironmentLifecycleError, EnvironmentLifecycleResult, EnvironmentLifecycleService};
