use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Locations;
use crate::markers::{FileMarkerStore, Marker, MarkerKind, MarkerStore};
use crate::plan::Plan;
use crate::state::{infer, UpdateState};

/// A present marker and, for scalar and capture markers, what it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerEntry {
    pub name: &'static str,
    pub content: Option<String>,
}

/// Read-only view of an update in progress
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub marker_dir: String,
    /// Short state label, or "BadState"
    pub state: String,
    pub description: String,
    /// No further run makes progress without intervention
    pub blocked: bool,
    pub markers: Vec<MarkerEntry>,
    /// Markers a run would clear before continuing
    pub stale: Vec<&'static str>,
    pub attempt_started_at: Option<DateTime<Utc>>,
    pub plan: String,
}

fn entry(store: &FileMarkerStore, marker: Marker) -> MarkerEntry {
    let content = match marker.kind() {
        MarkerKind::Presence => None,
        MarkerKind::Scalar => store.read_scalar(marker).map(|value| value.to_string()),
        // last line is usually the one that explains the failure
        MarkerKind::Capture => store
            .read_capture(marker)
            .and_then(|text| text.lines().last().map(str::to_string)),
    };
    MarkerEntry {
        name: marker.file_name(),
        content,
    }
}

pub struct StatusCommand {
    pub locations: Locations,
    pub json: bool,
}

impl StatusCommand {
    pub fn new(locations: Locations, json: bool) -> Self {
        Self { locations, json }
    }

    pub fn report(&self) -> Result<StatusReport> {
        let dir = &self.locations.marker_dir;
        if !dir.is_dir() {
            bail!("Marker directory {} does not exist", dir.display());
        }
        let store = FileMarkerStore::open_read_only(dir)?;
        let present = store.snapshot()?;

        let (state, description, blocked, stale) = match infer(present) {
            Ok(inference) => (
                inference.state.code().to_string(),
                inference.state.description().to_string(),
                inference.state.is_terminal() && inference.state != UpdateState::Done,
                inference.stale.names(),
            ),
            Err(e) => ("BadState".to_string(), e.to_string(), true, Vec::new()),
        };

        let plan = match Plan::load(&self.locations.plan) {
            Ok(plan) => plan.summary(),
            Err(e) => e.to_string(),
        };

        Ok(StatusReport {
            marker_dir: dir.display().to_string(),
            state,
            description,
            blocked,
            markers: present.iter().map(|marker| entry(&store, marker)).collect(),
            stale,
            attempt_started_at: store.modified_at(Marker::AttemptStarted),
            plan,
        })
    }

    pub fn execute(&self) -> Result<()> {
        let report = self.report()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("📦 UPDATE STATUS");
        println!("================");
        println!("📋 State: {} ({})", report.state, report.description);
        println!("📁 Markers in {}:", report.marker_dir);
        if report.markers.is_empty() {
            println!("   (none)");
        }
        for marker in &report.markers {
            match &marker.content {
                Some(content) => println!("   • {}: {}", marker.name, content),
                None => println!("   • {}", marker.name),
            }
        }
        if !report.stale.is_empty() {
            println!("🧹 Stale, cleared on next run: {}", report.stale.join(", "));
        }
        if let Some(started) = report.attempt_started_at {
            println!("🕒 Attempt started: {}", started.to_rfc3339());
        }
        if report.blocked {
            println!("⛔ Blocked: clear the marker directory to start a new attempt");
        }
        println!("🗺️  Plan: {}", report.plan);
        Ok(())
    }
}
