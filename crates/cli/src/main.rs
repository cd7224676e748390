//! # Lapcoach CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Pipeline orchestration and lifecycle management
//! - Graceful shutdown handling
//! - Offline lap comparison

mod cli;
mod commands;
mod error;
mod handlers;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::Layer;

use cli::{Cli, Commands};
use commands::{run_compare, run_info, run_pipeline, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "lapcoach CLI starting");

    // Handler invocations run on this runtime's worker threads; the pool
    // size comes from the run configuration when one is readable.
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = configured_worker_threads(&cli) {
        info!(workers, "Using configured worker pool size");
        builder.worker_threads(workers);
    }
    let runtime = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build runtime: {}", e))?;

    // Execute command
    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Run(args) => run_pipeline(args).await,
            Commands::Validate(args) => run_validate(args),
            Commands::Info(args) => run_info(args),
            Commands::Compare(args) => run_compare(args),
        }
    });

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Peek at the run config for an explicit worker pool size. Load errors
/// are ignored here; the run command reports them properly.
fn configured_worker_threads(cli: &Cli) -> Option<usize> {
    if let Commands::Run(args) = &cli.command {
        if let Ok(settings) = config_loader::ConfigLoader::load_from_path(&args.config) {
            return settings.bus.worker_threads;
        }
    }
    None
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let fmt_layer = match cli.log_format {
        cli::LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        cli::LogFormat::Pretty => fmt::layer().pretty().boxed(),
        cli::LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
