use std::fmt;

use serde::Serialize;

/// How a run ended. Each outcome maps to one process exit status, which is
/// the only channel the supervising scheduler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Update finished, now or in an earlier run.
    Finished,
    /// Reboot requested; the next run picks up after it.
    RebootPending,
    /// Direct execution not enabled in configuration.
    NotConfigured,
    PlanMissing,
    MarkerDirMissing,
    /// Markers decoded to a combination no transition can produce.
    BadState,
    /// First install failure. Reserved: a first failure is always turned
    /// into a reboot-then-retry by the driver.
    InstallFailed,
    /// Second consecutive install failure, detected during this run.
    InstallFailedAgain,
    /// Second consecutive install failure found at start; nothing attempted.
    InstallRefused,
    RebootFailed,
    /// The executor reported that the reboot request itself failed.
    RebootRequestFailed,
}

impl Outcome {
    pub const ALL: [Outcome; 11] = [
        Outcome::Finished,
        Outcome::RebootPending,
        Outcome::NotConfigured,
        Outcome::PlanMissing,
        Outcome::MarkerDirMissing,
        Outcome::BadState,
        Outcome::InstallFailed,
        Outcome::InstallFailedAgain,
        Outcome::InstallRefused,
        Outcome::RebootFailed,
        Outcome::RebootRequestFailed,
    ];

    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Finished | Outcome::RebootPending => 0,
            Outcome::NotConfigured => 3,
            Outcome::PlanMissing => 5,
            Outcome::MarkerDirMissing => 6,
            Outcome::BadState => 7,
            Outcome::InstallFailed => 10,
            Outcome::InstallFailedAgain => 11,
            Outcome::InstallRefused => 12,
            Outcome::RebootFailed => 20,
            Outcome::RebootRequestFailed => 21,
        }
    }

    pub fn is_success(self) -> bool {
        self.exit_code() == 0
    }

    /// Outcomes after which the scheduler must stop re-invoking and wait for
    /// an operator.
    pub fn is_permanent(self) -> bool {
        matches!(
            self,
            Outcome::BadState
                | Outcome::InstallFailedAgain
                | Outcome::InstallRefused
                | Outcome::RebootFailed
                | Outcome::RebootRequestFailed
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::Finished => "update finished",
            Outcome::RebootPending => "reboot pending",
            Outcome::NotConfigured => "not configured for direct execution",
            Outcome::PlanMissing => "update plan does not exist",
            Outcome::MarkerDirMissing => "marker directory does not exist",
            Outcome::BadState => "bad state",
            Outcome::InstallFailed => "install failed",
            Outcome::InstallFailedAgain => "install failed again",
            Outcome::InstallRefused => "install failed twice before, refusing to try",
            Outcome::RebootFailed => "reboot failed",
            Outcome::RebootRequestFailed => "reboot request failed",
        };
        f.write_str(text)
    }
}

impl From<Outcome> for std::process::ExitCode {
    fn from(outcome: Outcome) -> Self {
        std::process::ExitCode::from(outcome.exit_code())
    }
}
