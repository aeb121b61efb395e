#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! tpb - third-party dependency build toolkit

mod cli;
mod commands;

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::io::IsTerminal;
use std::process;
use tpb_config::{ColorChoice, Config};
use tpb_deps::Registry;
use tpb_errors::{Error, UserFacingError};
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(code = e.user_code().unwrap_or("internal"), "{e}");
        eprintln!("Error: {}", e.user_message());
        if let Some(hint) = e.user_hint() {
            eprintln!("Hint: {hint}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(color) = cli.global.color {
        config.general.color = color;
    }
    if cli.global.verbose {
        config.general.verbose = true;
    }

    init_tracing(config.general.verbose, config.general.color);
    debug!(
        build_jobs = config.build.build_jobs,
        install_prefix = %config.install_prefix().display(),
        "configuration loaded"
    );

    let registry = Registry::builtin();
    let json = cli.global.json;

    match cli.command {
        Commands::List { group } => commands::list(&registry, group, json),
        Commands::Plan { name } => commands::plan(&registry, &config, &name, json),
        Commands::Env { program } => {
            commands::env(program.as_deref());
            Ok(())
        }
        Commands::SaveEnv { path } => commands::save_env(&config, path),
        Commands::WithEnv { set, unset } => commands::with_env(&set, &unset),
    }
}

/// Logs go to stderr so command output on stdout stays parseable
fn init_tracing(verbose: bool, color: ColorChoice) {
    let default_level = if verbose { "debug" } else { "info" };
    let ansi = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init();
}
