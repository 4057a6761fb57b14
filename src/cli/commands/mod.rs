use std::path::PathBuf;

use crate::config::UpdataConfig;

pub mod graph;
pub mod run;
pub mod show_config;
pub mod status;

pub use graph::GraphCommand;
pub use run::RunCommand;
pub use show_config::ShowConfigCommand;
pub use status::StatusCommand;

/// Plan and marker locations after applying command line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub plan: PathBuf,
    pub marker_dir: PathBuf,
}

impl Locations {
    pub fn resolve(config: &UpdataConfig, plan: Option<PathBuf>, marker_dir: Option<PathBuf>) -> Self {
        Self {
            plan: plan.unwrap_or_else(|| config.orchestrator.plan_file.clone()),
            marker_dir: marker_dir.unwrap_or_else(|| config.orchestrator.marker_dir.clone()),
        }
    }
}
