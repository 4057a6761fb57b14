//! Plan executor abstraction
//!
//! The executor is the external tool that actually downloads, installs and
//! reboots. This module only knows how to launch it in one of its two modes,
//! where its stderr goes, and how to read its exit status.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ExecutorConfig;
use crate::markers::CaptureSink;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Exit status the executor uses in reboot-only mode when the reboot request
/// itself failed.
pub const REBOOT_REQUEST_FAILED: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    /// Download and install, do not reboot.
    InstallOnly,
    /// Reboot only.
    RebootOnly,
}

impl ExecutorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorMode::InstallOnly => "install-only",
            ExecutorMode::RebootOnly => "reboot-only",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Plan executor not found: {program}")]
    NotFound { program: String },
    #[error("Failed to run plan executor {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for running the plan executor.
///
/// Returns the executor's exit status; 0 is success. Stderr goes into the
/// given sink.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn run(
        &self,
        mode: ExecutorMode,
        plan: &Path,
        stderr: CaptureSink,
    ) -> Result<i32, ExecutorError>;
}

/// Real implementation spawning the configured program.
#[derive(Debug, Clone)]
pub struct ProcessPlanExecutor {
    program: PathBuf,
    extra_args: Vec<String>,
    plan_flag: String,
    install_flag: String,
    reboot_flag: String,
}

impl ProcessPlanExecutor {
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            extra_args: config.extra_args.clone(),
            plan_flag: config.plan_flag.clone(),
            install_flag: config.install_flag.clone(),
            reboot_flag: config.reboot_flag.clone(),
        }
    }

    /// Arguments for one invocation, in order.
    pub fn args(&self, mode: ExecutorMode, plan: &Path) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push(match mode {
            ExecutorMode::InstallOnly => self.install_flag.clone(),
            ExecutorMode::RebootOnly => self.reboot_flag.clone(),
        });
        args.push(self.plan_flag.clone());
        args.push(plan.display().to_string());
        args
    }

    fn map_spawn_error(&self, e: std::io::Error) -> ExecutorError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExecutorError::NotFound {
                program: self.program.display().to_string(),
            }
        } else {
            ExecutorError::Io {
                program: self.program.display().to_string(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl PlanExecutor for ProcessPlanExecutor {
    async fn run(
        &self,
        mode: ExecutorMode,
        plan: &Path,
        stderr: CaptureSink,
    ) -> Result<i32, ExecutorError> {
        let args = self.args(mode, plan);
        info!(program = %self.program.display(), mode = mode.as_str(), ?args, "Running plan executor");

        let mut command = tokio::process::Command::new(&self.program);
        command.args(&args).stdin(Stdio::null());

        let status = match stderr.into_file() {
            Ok(file) => command
                .stderr(Stdio::from(file))
                .status()
                .await
                .map_err(|e| self.map_spawn_error(e))?,
            Err(mut sink) => {
                let output = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| self.map_spawn_error(e))?;
                std::io::Write::write_all(&mut sink, &output.stderr).map_err(|e| {
                    ExecutorError::Io {
                        program: self.program.display().to_string(),
                        source: e,
                    }
                })?;
                output.status
            }
        };

        let code = status.code().unwrap_or(-1);
        debug!(mode = mode.as_str(), code, "Plan executor finished");
        Ok(code)
    }
}
