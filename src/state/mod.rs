//! Logical update states
//!
//! The state of an update is never stored directly. It is re-derived from the
//! marker set on every process start (see [`inference`]) and then driven
//! forward by the orchestrator.

pub mod inference;
pub mod transitions;

use std::fmt;

use serde::Serialize;

pub use inference::{infer, Inference, InferenceError};
pub use transitions::{documents, render_dot, render_markdown, TransitionDoc, TRANSITIONS};

/// Named points in the update lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpdateState {
    /// No attempt recorded yet.
    Init,
    /// Download and install. `retry` is set when this is the single
    /// automatic retry after a failed first install.
    Install { retry: bool },
    /// Re-entered after the recovery reboot; about to retry the install.
    RetryInstall,
    /// Install succeeded, reboot not yet arranged.
    InstallSucceeded,
    /// Reboot after a successful install.
    Reboot,
    /// Re-entered after the final reboot; about to mark the update finished.
    Finalize,
    RebootFailed,
    /// First install failure, not yet flagged as repeated.
    InstallFailed,
    /// Second consecutive install failure. Never retried automatically.
    InstallFailedAgain,
    /// Reboot that precedes the install retry.
    RecoveryReboot,
    RecoveryRebootFailed,
    Done,
}

impl UpdateState {
    /// Every state, in lifecycle order.
    pub const ALL: [UpdateState; 13] = [
        UpdateState::Init,
        UpdateState::Install { retry: false },
        UpdateState::Install { retry: true },
        UpdateState::InstallSucceeded,
        UpdateState::Reboot,
        UpdateState::Finalize,
        UpdateState::RebootFailed,
        UpdateState::InstallFailed,
        UpdateState::RecoveryReboot,
        UpdateState::RetryInstall,
        UpdateState::InstallFailedAgain,
        UpdateState::RecoveryRebootFailed,
        UpdateState::Done,
    ];

    /// Short label used in logs, the state table and the graph.
    pub fn code(self) -> &'static str {
        match self {
            UpdateState::Init => "init",
            UpdateState::Install { .. } => "U",
            UpdateState::RetryInstall => "R",
            UpdateState::InstallSucceeded => "US",
            UpdateState::Reboot => "UR",
            UpdateState::Finalize => "C",
            UpdateState::RebootFailed => "URF",
            UpdateState::InstallFailed => "UF",
            UpdateState::InstallFailedAgain => "RF",
            UpdateState::RecoveryReboot => "FR",
            UpdateState::RecoveryRebootFailed => "FRF",
            UpdateState::Done => "done",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UpdateState::Init => "no update attempt recorded",
            UpdateState::Install { retry: false } => "installing update",
            UpdateState::Install { retry: true } => "retrying failed install",
            UpdateState::RetryInstall => "rebooted after install failure, resuming to retry",
            UpdateState::InstallSucceeded => "install succeeded, reboot not yet requested",
            UpdateState::Reboot => "rebooting into updated system",
            UpdateState::Finalize => "rebooted after install, finishing update",
            UpdateState::RebootFailed => "reboot after install failed",
            UpdateState::InstallFailed => "install failed, reboot before retry pending",
            UpdateState::InstallFailedAgain => "install failed twice, giving up",
            UpdateState::RecoveryReboot => "rebooting before install retry",
            UpdateState::RecoveryRebootFailed => "reboot before install retry failed",
            UpdateState::Done => "update finished",
        }
    }

    /// States the driver only leaves by ending the process.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UpdateState::Done
                | UpdateState::RebootFailed
                | UpdateState::InstallFailedAgain
                | UpdateState::RecoveryRebootFailed
        )
    }

    /// States that are only ever entered by inference at process start.
    pub fn is_reentry_only(self) -> bool {
        matches!(self, UpdateState::Finalize | UpdateState::RetryInstall)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
