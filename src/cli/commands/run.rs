use anyhow::Result;
use tracing::error;

use super::Locations;
use crate::config::UpdataConfig;
use crate::external::ProcessPlanExecutor;
use crate::orchestrator::{run_update, Outcome};

pub struct RunCommand {
    pub locations: Locations,
}

impl RunCommand {
    pub fn new(locations: Locations) -> Self {
        Self { locations }
    }

    pub async fn execute(&self, config: &UpdataConfig) -> Result<Outcome> {
        let executor = ProcessPlanExecutor::from_config(&config.executor);
        let outcome = run_update(
            config.orchestrator.direct_execution,
            &self.locations.plan,
            &self.locations.marker_dir,
            &executor,
        )
        .await?;
        if outcome.is_permanent() {
            error!(outcome = %outcome, code = outcome.exit_code(), "Update stopped, operator attention needed");
        }
        Ok(outcome)
    }
}
