use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "/etc/updata/updata.toml";

/// Main configuration structure for updata
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdataConfig {
    /// Where state lives and whether the orchestrator may act
    pub orchestrator: OrchestratorConfig,
    /// How to invoke the plan executor
    pub executor: ExecutorConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Directory holding the marker files
    pub marker_dir: PathBuf,
    /// Precomputed update plan handed to the executor
    pub plan_file: PathBuf,
    /// Must be enabled explicitly before `run` does anything
    pub direct_execution: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the mode flag
    pub extra_args: Vec<String>,
    /// Flag introducing the plan path
    pub plan_flag: String,
    /// Flag selecting download+install without reboot
    pub install_flag: String,
    /// Flag selecting reboot only
    pub reboot_flag: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub json: bool,
}

impl Default for UpdataConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                marker_dir: PathBuf::from("/var/lib/updata/markers"),
                plan_file: PathBuf::from("/var/lib/updata/plan.json"),
                direct_execution: false, // Opt-in only
            },
            executor: ExecutorConfig {
                program: "updata_execute".to_string(),
                extra_args: Vec::new(),
                plan_flag: "--plan".to_string(),
                install_flag: "--install-only".to_string(),
                reboot_flag: "--reboot-only".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl UpdataConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (explicit path, or /etc/updata/updata.toml if present)
    /// 3. Environment variables (prefixed with UPDATA__, nested keys separated by __)
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("UPDATA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
        }
        Ok(())
    }
}
