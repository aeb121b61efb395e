//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tpb_config::ColorChoice;
use tpb_deps::BuildGroup;

/// tpb - third-party dependency build toolkit
#[derive(Parser)]
#[command(name = "tpb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Third-party dependency build toolkit")]
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

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the known dependency definitions
    #[command(alias = "ls")]
    List {
        /// Only show dependencies in this build group
        #[arg(long, value_enum)]
        group: Option<BuildGroup>,
    },

    /// Show what building a dependency would request
    Plan {
        /// Dependency name
        name: String,
    },

    /// Log the current environment
    Env {
        /// Program name used in the heading
        #[arg(long)]
        program: Option<String>,
    },

    /// Save the build-relevant part of the environment as a shell script
    SaveEnv {
        /// Output file (default: <build_root>/<env_file_name>)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Apply environment overrides in a scope and show the result
    WithEnv {
        /// Variable to set, as NAME=VALUE
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Variable to remove
        #[arg(long = "unset", value_name = "NAME")]
        unset: Vec<String>,
    },
}
