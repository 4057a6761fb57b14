//! Reconstructs the logical state from the markers found at process start.
//!
//! Precedence, first match wins:
//!
//! 1. `update-finished` → done
//! 2. no `attempt-started` → init, everything else is debris
//! 3. `install-phase-done` → US / UR / URF / C depending on reboot progress
//! 4. `install-failure` → RF / UF / FR / FRF / R depending on reboot progress
//! 5. otherwise an install was in flight → U
//!
//! Each rule names the markers it clears as stale. A marker that is neither
//! load-bearing, stale, nor tolerated for the chosen rule cannot be produced
//! by any sequence of transitions and makes the whole set a bad state.

use thiserror::Error;

use super::UpdateState;
use crate::markers::{Marker, MarkerSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Unreachable marker combination {present}: {unexpected} cannot be present in state {candidate}")]
    BadState {
        present: MarkerSet,
        unexpected: MarkerSet,
        candidate: UpdateState,
    },
}

/// Result of inference: where to start, and which markers to clear first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inference {
    pub state: UpdateState,
    pub stale: MarkerSet,
}

struct Rule {
    state: UpdateState,
    stale: MarkerSet,
    forbidden: MarkerSet,
}

impl Rule {
    fn new(state: UpdateState) -> Self {
        Self {
            state,
            stale: MarkerSet::empty(),
            forbidden: MarkerSet::empty(),
        }
    }

    fn stale(mut self, markers: impl Into<MarkerSet>) -> Self {
        self.stale = self.stale.union(markers.into());
        self
    }

    fn forbid(mut self, markers: impl Into<MarkerSet>) -> Self {
        self.forbidden = self.forbidden.union(markers.into());
        self
    }
}

/// Infer the logical state for a marker set.
pub fn infer(present: MarkerSet) -> Result<Inference, InferenceError> {
    let rule = select_rule(present);

    let unexpected = present.intersection(rule.forbidden);
    if !unexpected.is_empty() {
        return Err(InferenceError::BadState {
            present,
            unexpected,
            candidate: rule.state,
        });
    }

    Ok(Inference {
        state: rule.state,
        stale: present.intersection(rule.stale),
    })
}

fn select_rule(present: MarkerSet) -> Rule {
    use Marker::*;

    let has = |marker| present.contains(marker);
    let stale_reboot = [RebootStderrCapture, RebootFailure, RebootExitCode];

    if has(UpdateFinished) {
        return Rule::new(UpdateState::Done);
    }

    if !has(AttemptStarted) {
        let mut debris = MarkerSet::from(Marker::ALL);
        debris.remove(AttemptStarted);
        return Rule::new(UpdateState::Init).stale(debris);
    }

    if has(InstallPhaseDone) {
        let installed = [InstallFailure, InstallFailureRepeated];
        return if !has(RebootPhaseStarted) {
            Rule::new(UpdateState::InstallSucceeded)
                .stale(installed)
                .stale(stale_reboot)
                .forbid([InstallExitCode])
        } else if !has(RebootStderrCapture) {
            Rule::new(UpdateState::Reboot)
                .stale(installed)
                .stale([RebootFailure])
                .forbid([InstallExitCode, RebootExitCode])
        } else if has(RebootFailure) {
            Rule::new(UpdateState::RebootFailed)
                .stale(installed)
                .forbid([InstallExitCode])
        } else {
            Rule::new(UpdateState::Finalize)
                .stale(installed)
                .forbid([InstallExitCode, RebootExitCode])
        };
    }

    if has(InstallFailure) {
        return if has(InstallFailureRepeated) {
            Rule::new(UpdateState::InstallFailedAgain).stale(Marker::REBOOT)
        } else if !has(RebootPhaseStarted) {
            Rule::new(UpdateState::InstallFailed).stale(stale_reboot)
        } else if !has(RebootStderrCapture) {
            Rule::new(UpdateState::RecoveryReboot)
                .stale([RebootFailure])
                .forbid([RebootExitCode])
        } else if has(RebootFailure) {
            Rule::new(UpdateState::RecoveryRebootFailed)
        } else {
            Rule::new(UpdateState::RetryInstall).forbid([RebootExitCode])
        };
    }

    Rule::new(UpdateState::Install { retry: false })
        .stale([InstallFailureRepeated])
        .stale(Marker::REBOOT)
        .forbid([InstallExitCode])
}
