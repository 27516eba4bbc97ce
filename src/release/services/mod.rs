//! Application services for the status matrix and release rollups.

mod locks;
mod manual_deployment;
mod matrix;
mod recalculation;

pub use locks::ReleaseLocks;
pub use manual_deployment::{
    ManualDeploymentError, ManualDeploymentResult, ManualDeploymentService, TaskRequest,
    TaskStatusUpdate,
};
pub use matrix::{MatrixMaintainer, MatrixMaintenanceError};
pub use recalculation::{RecalculationError, RecalculationOrchestrator, ReleaseStatusChange};
