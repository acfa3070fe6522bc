//! Application runner logic
//!
//! Loads the configuration, composes every style and patches the results.

use crate::compose::{compose_all, PipelineContext};
use crate::core::cli::CliArgs;
use crate::core::config_file::BuildConfig;
use crate::logging;
use crate::tables::patch_all;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;

/// Run a full build with the given CLI arguments.
pub fn run_app(cli_args: CliArgs) -> Result<Vec<PathBuf>> {
    cli_args.validate().map_err(|msg| anyhow!(msg))?;
    let _log_guard = logging::init();

    let config_path = BuildConfig::locate(cli_args.config.as_deref());
    let config = BuildConfig::load(&config_path)?;
    let ctx = PipelineContext::new(config, cli_args.policy());
    run_pipeline(&ctx)
}

/// Compose, then patch, every style of one run.
pub fn run_pipeline(ctx: &PipelineContext) -> Result<Vec<PathBuf>> {
    info!(
        "Building {}{} into {}",
        ctx.config.font_name,
        ctx.variant(),
        ctx.config.build_fonts_dir.display()
    );
    compose_all(ctx)?;
    let outputs = patch_all(ctx)?;
    info!("Finished {} of 4 styles", outputs.len());
    Ok(outputs)
}
