//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lapcoach - racing telemetry lap analysis pipeline
#[derive(Parser, Debug)]
#[command(
    name = "lapcoach",
    author,
    version,
    about = "Racing telemetry lap analysis pipeline",
    long_about = "Ingests a fixed-rate vehicle telemetry stream, assembles it into laps,\n\
                  extracts braking-zone and corner metrics, and compares laps for\n\
                  coaching feedback."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LAPCOACH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LAPCOACH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the telemetry analysis pipeline
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Compare two laps' extracted metrics
    Compare(CompareArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "lapcoach.toml", env = "LAPCOACH_CONFIG")]
    pub config: PathBuf,

    /// Override the frame source mode from configuration
    #[arg(long, value_enum, env = "LAPCOACH_SOURCE")]
    pub source: Option<SourceModeArg>,

    /// Override the replay telemetry file from configuration
    #[arg(long, env = "LAPCOACH_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Override the replay speed multiplier (0 = as fast as possible)
    #[arg(long, env = "LAPCOACH_REPLAY_SPEED")]
    pub replay_speed: Option<f64>,

    /// Override the synthetic lap count
    #[arg(long)]
    pub laps: Option<u32>,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LAPCOACH_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running the pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Enable the upload/persistence handler regardless of configuration
    #[arg(long)]
    pub upload: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LAPCOACH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "lapcoach.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "lapcoach.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `compare` command
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Baseline lap metrics (JSON file produced by the upload handler)
    pub baseline: PathBuf,

    /// Candidate lap metrics to compare against the baseline
    pub candidate: PathBuf,

    /// Match tolerance in lap-distance fraction
    #[arg(long, default_value = "0.10")]
    pub tolerance: f64,

    /// Output the full comparison as JSON
    #[arg(long)]
    pub json: bool,
}

/// Frame source selection for CLI overrides
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SourceModeArg {
    /// Replay a recorded telemetry file
    Replay,
    /// Generate a deterministic synthetic circuit
    Synthetic,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
