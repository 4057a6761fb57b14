use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "updata")]
#[command(about = "Crash-safe, multi-reboot update orchestration")]
#[command(long_about = "updata drives a precomputed update plan through install, reboot and \
                       at most one retry, resuming from on-disk markers after every restart. \
                       Run 'updata run' from a timer or service unit; the exit status tells \
                       the scheduler whether to call again.")]
pub struct Cli {
    /// Configuration file (default: /etc/updata/updata.toml if present)
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive the update as far as possible in this process (default command)
    Run {
        /// Update plan handed to the executor
        #[arg(long, help = "Override orchestrator.plan_file")]
        plan: Option<PathBuf>,
        /// Directory holding the marker files
        #[arg(long, help = "Override orchestrator.marker_dir")]
        marker_dir: Option<PathBuf>,
    },
    /// Show the state inferred from the markers without changing anything
    Status {
        #[arg(long, help = "Override orchestrator.plan_file")]
        plan: Option<PathBuf>,
        #[arg(long, help = "Override orchestrator.marker_dir")]
        marker_dir: Option<PathBuf>,
        /// Print machine-readable JSON
        #[arg(long, help = "Emit status as JSON")]
        json: bool,
    },
    /// Render the state table or transition graph
    Graph {
        #[arg(long, value_enum, default_value_t = GraphFormat::Dot, help = "Output format")]
        format: GraphFormat,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Dot,
    Markdown,
}
