// updata Library - Crash-Safe Update Orchestration
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod external;
pub mod markers;
pub mod orchestrator;
pub mod plan;
pub mod state;
pub mod telemetry;

// Re-export key types for easy access
pub use config::UpdataConfig;
pub use external::{ExecutorError, ExecutorMode, PlanExecutor, ProcessPlanExecutor};
pub use markers::{CaptureSink, FileMarkerStore, Marker, MarkerError, MarkerSet, MarkerStore};
pub use orchestrator::{run_update, Outcome, RunReport, UpdateDriver};
pub use plan::Plan;
pub use state::{infer, Inference, InferenceError, UpdateState};
pub use telemetry::init_telemetry;
