//! # sprout-cli
//!
//! Command line front end for the Sprout tool planner.
//!
//! This is the main entry point for the `sprout` binary. It handles command
//! parsing, sets up logging and error reporting, and dispatches to the
//! command handlers that run the build, detect, resolve and order pipeline.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Plan tool installations from a dependency graph
#[derive(Parser)]
#[command(name = "sprout", version, about = "Plan tool installations from a dependency graph")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine readable JSON instead of a report
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the conflicts among the requested tools
    Check(PipelineArgs),
    /// Print the installation order, refusing while critical conflicts remain
    Order(PipelineArgs),
    /// Resolve conflicts and print the resulting installation order
    Resolve {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Plan the resolution without applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show structural statistics of the dependency graph
    Stats(PipelineArgs),
}

/// Inputs shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Descriptor catalog (.json or .toml); defaults to `catalog` in sprout.toml
    #[arg(short, long, value_name = "FILE")]
    pub catalog: Option<Utf8PathBuf>,

    /// Target operating system (linux, macos, windows)
    #[arg(long)]
    pub os: Option<String>,

    /// Target architecture (x64, arm64, x86)
    #[arg(long)]
    pub arch: Option<String>,

    /// Tools to plan for; all catalog tools when omitted
    #[arg(value_name = "TOOL")]
    pub targets: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting Sprout CLI v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(true) => ExitCode::SUCCESS,
        // Conflicts left unresolved
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("{}", ErrorFormatter::new().format_anyhow(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<bool> {
    let ctx = CommandContext::new(cli.json)?;
    commands::dispatch_command(cli.command, &ctx)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "sprout=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Sprout encountered an unexpected error: {}", panic_info);
        eprintln!("Sprout crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/sprout-tools/sprout/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
