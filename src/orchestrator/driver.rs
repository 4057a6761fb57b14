//! The transition loop.
//!
//! `run` infers the starting state once, then applies `step` until a step
//! ends the run. Each step performs its marker effects before returning, so
//! a crash between two steps always leaves a marker set inference can read.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use super::Outcome;
use crate::external::{ExecutorError, ExecutorMode, PlanExecutor, REBOOT_REQUEST_FAILED};
use crate::markers::{Marker, MarkerError, MarkerStore};
use crate::plan::Plan;
use crate::state::{infer, UpdateState};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Marker store error: {0}")]
    Marker(#[from] MarkerError),
    #[error("Plan executor error: {0}")]
    Executor(#[from] ExecutorError),
}

/// What a single step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next(UpdateState),
    Exit(Outcome),
}

/// Result of one run: the outcome plus every state visited, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub visited: Vec<UpdateState>,
}

pub struct UpdateDriver<'a> {
    store: &'a dyn MarkerStore,
    executor: &'a dyn PlanExecutor,
    plan: PathBuf,
}

impl<'a> UpdateDriver<'a> {
    pub fn new(
        store: &'a dyn MarkerStore,
        executor: &'a dyn PlanExecutor,
        plan: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            executor,
            plan: plan.into(),
        }
    }

    pub async fn run(&self) -> Result<RunReport, DriverError> {
        let present = self.store.snapshot()?;
        let inference = match infer(present) {
            Ok(inference) => inference,
            Err(e) => {
                error!(error = %e, "Bad state, refusing to continue");
                return Ok(RunReport {
                    outcome: Outcome::BadState,
                    visited: Vec::new(),
                });
            }
        };

        if !inference.stale.is_empty() {
            info!(stale = %inference.stale, "Clearing stale markers");
            self.store.delete_all(inference.stale)?;
        }

        let mut state = inference.state;
        if !matches!(state, UpdateState::Init | UpdateState::Done) {
            info!(state = %state, "Resuming update: {}", state.description());
        }

        let mut visited = vec![state];
        let mut first = true;
        loop {
            match self.step(state, first).await? {
                Step::Next(next) => {
                    info!(from = %state, to = %next, "State transition");
                    visited.push(next);
                    state = next;
                    first = false;
                }
                Step::Exit(outcome) => {
                    info!(state = %state, outcome = %outcome, code = outcome.exit_code(), "Update run ended");
                    return Ok(RunReport { outcome, visited });
                }
            }
        }
    }

    /// Execute one state. `first` is true for the state inference produced.
    pub async fn step(&self, state: UpdateState, first: bool) -> Result<Step, DriverError> {
        let store = self.store;
        let step = match state {
            UpdateState::Init => {
                self.log_plan();
                store.create(Marker::AttemptStarted)?;
                store.sync()?;
                Step::Next(UpdateState::Install { retry: false })
            }
            UpdateState::Install { retry } => {
                store.delete(Marker::InstallExitCode)?;
                let code = self
                    .run_executor(ExecutorMode::InstallOnly, Marker::InstallFailure)
                    .await?;
                if code == 0 {
                    store.create(Marker::InstallPhaseDone)?;
                    store.delete(Marker::InstallFailure)?;
                    Step::Next(UpdateState::InstallSucceeded)
                } else if retry {
                    // durable before anything else: install-failure without
                    // the flag reads as a first failure and earns another retry
                    store.create(Marker::InstallFailureRepeated)?;
                    store.sync()?;
                    store.write_scalar(Marker::InstallExitCode, code)?;
                    Step::Next(UpdateState::InstallFailedAgain)
                } else {
                    store.write_scalar(Marker::InstallExitCode, code)?;
                    Step::Next(UpdateState::InstallFailed)
                }
            }
            UpdateState::RetryInstall => {
                info!("Resuming to retry failed install");
                store.delete_all(Marker::REBOOT.into())?;
                Step::Next(UpdateState::Install { retry: true })
            }
            UpdateState::InstallSucceeded => {
                store.create(Marker::RebootPhaseStarted)?;
                store.sync()?;
                Step::Next(UpdateState::Reboot)
            }
            UpdateState::Reboot => match self.reboot(false).await? {
                Some(_) => Step::Next(UpdateState::RebootFailed),
                None => Step::Exit(Outcome::RebootPending),
            },
            UpdateState::Finalize => {
                info!("Update finished");
                store.create(Marker::UpdateFinished)?;
                store.sync()?;
                Step::Exit(Outcome::Finished)
            }
            UpdateState::RebootFailed => Step::Exit(self.report_reboot_failure()),
            UpdateState::RecoveryRebootFailed => {
                // already set unless the run that failed the reboot died first
                store.create(Marker::InstallFailureRepeated)?;
                Step::Exit(self.report_reboot_failure())
            }
            UpdateState::InstallFailed => {
                self.report_install_failure();
                info!("Rebooting before retrying install");
                store.create(Marker::RebootPhaseStarted)?;
                store.sync()?;
                Step::Next(UpdateState::RecoveryReboot)
            }
            UpdateState::InstallFailedAgain => {
                self.report_install_failure();
                error!("Install failed twice in a row, giving up");
                Step::Exit(if first {
                    Outcome::InstallRefused
                } else {
                    Outcome::InstallFailedAgain
                })
            }
            UpdateState::RecoveryReboot => match self.reboot(true).await? {
                Some(_) => Step::Next(UpdateState::RecoveryRebootFailed),
                None => Step::Exit(Outcome::RebootPending),
            },
            UpdateState::Done => {
                info!("Update already finished, nothing to do");
                Step::Exit(Outcome::Finished)
            }
        };
        Ok(step)
    }

    /// Run the executor with stderr going into `capture`. The capture marker
    /// is made durable before the executor starts.
    async fn run_executor(&self, mode: ExecutorMode, capture: Marker) -> Result<i32, DriverError> {
        let sink = self.store.capture_stream(capture)?;
        self.store.sync()?;
        let code = self.executor.run(mode, &self.plan, sink).await?;
        Ok(code)
    }

    /// Request the reboot. `None` on success, the exit status otherwise.
    /// A failed `recovery` reboot also rules out the install retry.
    async fn reboot(&self, recovery: bool) -> Result<Option<i32>, DriverError> {
        self.store.delete(Marker::RebootExitCode)?;
        let code = self
            .run_executor(ExecutorMode::RebootOnly, Marker::RebootStderrCapture)
            .await?;
        if code == 0 {
            info!("Reboot requested");
            return Ok(None);
        }
        self.store.create(Marker::RebootFailure)?;
        if recovery {
            // no retry after a reboot that never happened
            self.store.create(Marker::InstallFailureRepeated)?;
            self.store.sync()?;
        }
        self.store.write_scalar(Marker::RebootExitCode, code)?;
        Ok(Some(code))
    }

    fn report_install_failure(&self) {
        let code = self
            .store
            .read_scalar(Marker::InstallExitCode)
            .map_or_else(|| "unknown".to_string(), |c| c.to_string());
        match self.store.read_capture(Marker::InstallFailure) {
            Some(stderr) => {
                error!(exit_code = %code, "Install failed: {}", stderr.trim_end())
            }
            None => error!(exit_code = %code, "Install failed with exit code {}", code),
        }
    }

    fn report_reboot_failure(&self) -> Outcome {
        let code = self
            .store
            .read_scalar(Marker::RebootExitCode)
            .unwrap_or(REBOOT_REQUEST_FAILED);
        match self.store.read_capture(Marker::RebootStderrCapture) {
            Some(stderr) => error!(exit_code = code, "Reboot failed: {}", stderr.trim_end()),
            None => error!(exit_code = code, "Reboot failed with exit code {}", code),
        }
        if code == REBOOT_REQUEST_FAILED {
            Outcome::RebootRequestFailed
        } else {
            Outcome::RebootFailed
        }
    }

    fn log_plan(&self) {
        match Plan::load(&self.plan) {
            Ok(plan) => {
                info!(plan = %self.plan.display(), "Starting update: {}", plan.summary());
                for step in &plan.steps {
                    info!(action = %step.action, details = ?step.details, "Planned step");
                }
            }
            Err(e) => warn!(plan = %self.plan.display(), error = %e, "Cannot inspect update plan"),
        }
    }
}
