//! Command implementations and dispatch logic.
//!
//! Every command loads the layered configuration, reads the descriptor
//! catalog and builds the graph through [`prepare`], then runs its part of
//! the pipeline. Handlers return `Ok(false)` when the run finished but left
//! conflicts standing.

use anyhow::{bail, Context, Result};
use camino::Utf8PathBuf;
use tracing::{debug, info};

use sprout_config::{load_catalog, ConfigLoader, SproutToml};
use sprout_core::error::SproutError;
use sprout_core::types::{TargetPlatform, ToolDescriptor};
use sprout_resolver::{build, ToolGraph};

pub mod check;
pub mod order;
pub mod resolve;
pub mod stats;

#[cfg(test)]
mod tests;

use crate::output::errors::ErrorFormatter;
use crate::output::OutputHandler;
use crate::{Commands, PipelineArgs};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    /// Base configuration loader; command line overrides are added per run
    pub loader: ConfigLoader,
    pub json: bool,
}

impl CommandContext {
    /// Create a context for the current directory and process environment
    pub fn new(json: bool) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| SproutError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).context("Current directory is not valid UTF-8")?;

        Ok(Self {
            loader: ConfigLoader::from_env(cwd.clone()),
            cwd,
            output: if json { OutputHandler::plain() } else { OutputHandler::new() },
            json,
        })
    }
}

/// Everything a command needs to run the pipeline
pub struct Prepared {
    pub config: SproutToml,
    pub platform: TargetPlatform,
    pub graph: ToolGraph,
    /// Requested tools, or every catalog tool when none were named
    pub targets: Vec<String>,
}

/// Dispatch a command to its handler
pub fn dispatch_command(command: Commands, ctx: &CommandContext) -> Result<bool> {
    match command {
        Commands::Check(args) => {
            info!("Checking {} tool(s) for conflicts", args.targets.len());
            check::execute(&args, ctx)
        }
        Commands::Order(args) => {
            info!("Ordering installation of {} tool(s)", args.targets.len());
            order::execute(&args, ctx)
        }
        Commands::Resolve { pipeline, dry_run } => {
            info!("Resolving conflicts (dry_run: {})", dry_run);
            resolve::execute(&pipeline, dry_run, ctx)
        }
        Commands::Stats(args) => {
            info!("Computing graph statistics");
            stats::execute(&args, ctx)
        }
    }
}

/// Load configuration and catalog, then build the graph
pub fn prepare(args: &PipelineArgs, ctx: &CommandContext) -> Result<Prepared> {
    let mut loader = ctx.loader.clone();
    if let Some(os) = &args.os {
        loader = loader.with_override("platform.os", os.as_str());
    }
    if let Some(arch) = &args.arch {
        loader = loader.with_override("platform.arch", arch.as_str());
    }
    let loaded = loader.load().context("Failed to load configuration")?;
    debug!(sources = ?loaded.sources, "configuration layers");
    let config = loaded.config;

    let catalog_path = args
        .catalog
        .as_ref()
        .map(|path| if path.is_relative() { ctx.cwd.join(path) } else { path.clone() })
        .or_else(|| config.catalog.clone())
        .ok_or_else(|| SproutError::ConfigValidation {
            field: "catalog".to_string(),
            reason: "no catalog given; pass --catalog or set `catalog` in sprout.toml".to_string(),
        })?;
    let descriptors = load_catalog(&catalog_path)?;

    let platform = config.platform.target()?;
    let result = build(&descriptors, platform, &config.build)?;

    let formatter = ErrorFormatter::new();
    for warning in &result.warnings {
        eprintln!("{}", formatter.format_warning(warning));
    }
    let Some(graph) = result.graph else {
        for error in &result.errors {
            eprintln!("{}", formatter.format_error(error));
        }
        bail!("Catalog {} has {} structural error(s)", catalog_path, result.errors.len());
    };

    let targets = if args.targets.is_empty() {
        all_ids(&descriptors)
    } else {
        args.targets.clone()
    };

    info!(%platform, tools = graph.node_count(), targets = targets.len(), "graph ready");
    Ok(Prepared {
        config,
        platform,
        graph,
        targets,
    })
}

fn all_ids(descriptors: &[ToolDescriptor]) -> Vec<String> {
    let mut ids: Vec<String> = descriptors.iter().map(|descriptor| descriptor.id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}
