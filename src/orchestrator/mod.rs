//! Update orchestration
//!
//! Preconditions, the transition driver and the outcome type the binary turns
//! into an exit status.

pub mod driver;
pub mod outcome;

use std::path::Path;

use tracing::{error, Instrument};

pub use driver::{DriverError, RunReport, Step, UpdateDriver};
pub use outcome::Outcome;

use crate::external::PlanExecutor;
use crate::markers::FileMarkerStore;
use crate::telemetry::{create_update_span, generate_run_id};

/// Checks done before any marker is read or written, in this order.
pub fn check_preconditions(direct_execution: bool, plan: &Path, marker_dir: &Path) -> Option<Outcome> {
    if !direct_execution {
        error!("Not configured for direct execution");
        return Some(Outcome::NotConfigured);
    }
    if !plan.is_file() {
        error!(plan = %plan.display(), "Update plan does not exist");
        return Some(Outcome::PlanMissing);
    }
    if !marker_dir.is_dir() {
        error!(dir = %marker_dir.display(), "Marker directory does not exist");
        return Some(Outcome::MarkerDirMissing);
    }
    None
}

/// Check preconditions, then drive the update stored in `marker_dir` as far
/// as it goes in this process.
pub async fn run_update(
    direct_execution: bool,
    plan: &Path,
    marker_dir: &Path,
    executor: &dyn PlanExecutor,
) -> Result<Outcome, DriverError> {
    if let Some(outcome) = check_preconditions(direct_execution, plan, marker_dir) {
        return Ok(outcome);
    }

    let run_id = generate_run_id();
    async {
        let store = FileMarkerStore::open(marker_dir)?;
        let report = UpdateDriver::new(&store, executor, plan).run().await?;
        Ok::<Outcome, DriverError>(report.outcome)
    }
    .instrument(create_update_span(&run_id))
    .await
}
