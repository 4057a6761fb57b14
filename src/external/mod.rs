//! External tool abstractions
//!
//! The plan executor is the one external collaborator. It sits behind a trait
//! so the driver can be exercised against scripted doubles.

pub mod executor;

pub use executor::{
    ExecutorError, ExecutorMode, PlanExecutor, ProcessPlanExecutor, REBOOT_REQUEST_FAILED,
};

#[cfg(any(test, feature = "testing"))]
pub use executor::MockPlanExecutor;
