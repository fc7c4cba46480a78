//! Command line interface definition

use clap::{Parser, Subcommand};
use stagehook_types::{ColorChoice, Stage};
use std::path::PathBuf;

/// stagehook - run pre-build hooks around filesystem image and firmware stages
#[derive(Parser)]
#[command(name = "stagehook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run pre-build hooks before filesystem image and firmware stages")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write JSON debug logs to .stagehook/logs/
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the project root hooks run in (relative to the current
    /// directory, like STAGEHOOK_PROJECT_ROOT; `[project] root` in the
    /// config file is relative to the file instead)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run stages in order; each stage's pre-actions run first
    Run {
        /// Stages to run
        #[arg(value_enum, required = true)]
        stages: Vec<Stage>,
    },

    /// Show registered pre-actions
    #[command(alias = "ls")]
    List {
        /// Only show this stage
        #[arg(value_enum)]
        stage: Option<Stage>,
    },

    /// List known stage names
    Stages,
}
