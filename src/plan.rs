//! Update plan inspection
//!
//! The plan is owned by the executor; the orchestrator only reads it to log
//! what is about to happen and to show it in `updata status`. A plan is a JSON
//! array of steps, each an object with an `action` and action-specific fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Cannot read plan {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Plan is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid plan: step {index} has no action")]
    MissingAction { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub action: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, PlanError> {
        let values: Vec<Value> = serde_json::from_str(raw)?;
        let steps = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(map) if map.get("action").is_some_and(Value::is_string) => {
                    Ok(serde_json::from_value(Value::Object(map))?)
                }
                _ => Err(PlanError::MissingAction { index }),
            })
            .collect::<Result<Vec<PlanStep>, PlanError>>()?;
        Ok(Self { steps })
    }

    pub fn actions(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.action.as_str()).collect()
    }

    /// One-line description, e.g. "2 steps: manage-repos, dnf-install".
    pub fn summary(&self) -> String {
        match self.steps.len() {
            0 => "empty plan".to_string(),
            1 => format!("1 step: {}", self.steps[0].action),
            n => format!("{} steps: {}", n, self.actions().join(", ")),
        }
    }
}
