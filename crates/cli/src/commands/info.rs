//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::PipelineSettings;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    source: SourceInfo,
    bus: BusInfo,
    assembler: AssemblerInfo,
    analysis: AnalysisInfo,
    comparison_tolerance: f64,
    upload: UploadInfo,
}

#[derive(Serialize)]
struct SourceInfo {
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_path: Option<String>,
    speed_multiplier: f64,
    frequency_hz: f64,
    synthetic_laps: u32,
}

#[derive(Serialize)]
struct BusInfo {
    lifecycle_capacity: usize,
    frame_capacity: usize,
    drain_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    worker_threads: Option<usize>,
}

#[derive(Serialize)]
struct AssemblerInfo {
    wrap_high: f64,
    wrap_low: f64,
    partial_lap_policy: String,
}

#[derive(Serialize)]
struct AnalysisInfo {
    brake_threshold: f64,
    decel_window: usize,
    steering_threshold_deg: f64,
    min_corner_frames: usize,
    throttle_threshold: f64,
    trail_steering_threshold_deg: f64,
}

#[derive(Serialize)]
struct UploadInfo {
    enabled: bool,
    output_dir: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let settings = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&settings);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&settings);
    }

    Ok(())
}

fn build_config_info(settings: &PipelineSettings) -> ConfigInfo {
    ConfigInfo {
        source: SourceInfo {
            mode: format!("{:?}", settings.source.mode),
            replay_path: settings
                .source
                .replay_path
                .as_ref()
                .map(|p| p.display().to_string()),
            speed_multiplier: settings.source.speed_multiplier,
            frequency_hz: settings.source.frequency_hz,
            synthetic_laps: settings.source.synthetic_laps,
        },
        bus: BusInfo {
            lifecycle_capacity: settings.bus.lifecycle_capacity,
            frame_capacity: settings.bus.frame_capacity,
            drain_timeout_ms: settings.bus.drain_timeout_ms,
            worker_threads: settings.bus.worker_threads,
        },
        assembler: AssemblerInfo {
            wrap_high: settings.assembler.wrap_high,
            wrap_low: settings.assembler.wrap_low,
            partial_lap_policy: format!("{:?}", settings.assembler.partial_lap_policy),
        },
        analysis: AnalysisInfo {
            brake_threshold: settings.analysis.brake_threshold,
            decel_window: settings.analysis.decel_window,
            steering_threshold_deg: settings.analysis.steering_threshold_deg,
            min_corner_frames: settings.analysis.min_corner_frames,
            throttle_threshold: settings.analysis.throttle_threshold,
            trail_steering_threshold_deg: settings.analysis.trail_steering_threshold_deg,
        },
        comparison_tolerance: settings.comparison.distance_tolerance,
        upload: UploadInfo {
            enabled: settings.upload.enabled,
            output_dir: settings.upload.output_dir.display().to_string(),
        },
    }
}

fn print_config_info(settings: &PipelineSettings) {
    println!("=== Lapcoach Configuration ===\n");

    println!("Source:");
    println!("  Mode: {:?}", settings.source.mode);
    match settings.source.replay_path {
        Some(ref path) => println!("  Replay file: {}", path.display()),
        None => println!("  Replay file: (none)"),
    }
    println!("  Speed: {}x", settings.source.speed_multiplier);
    println!("  Frequency: {} Hz", settings.source.frequency_hz);
    println!("  Synthetic laps: {}", settings.source.synthetic_laps);

    println!("\nEvent bus:");
    println!("  Lifecycle queue: {}", settings.bus.lifecycle_capacity);
    println!("  Frame queue: {}", settings.bus.frame_capacity);
    println!("  Drain timeout: {} ms", settings.bus.drain_timeout_ms);
    match settings.bus.worker_threads {
        Some(workers) => println!("  Worker threads: {}", workers),
        None => println!("  Worker threads: (available parallelism)"),
    }

    println!("\nLap assembly:");
    println!("  Wrap high: {}", settings.assembler.wrap_high);
    println!("  Wrap low: {}", settings.assembler.wrap_low);
    println!(
        "  Partial lap policy: {:?}",
        settings.assembler.partial_lap_policy
    );

    println!("\nAnalysis thresholds:");
    println!("  Brake: {}", settings.analysis.brake_threshold);
    println!("  Deceleration window: {} frames", settings.analysis.decel_window);
    println!("  Steering: {} deg", settings.analysis.steering_threshold_deg);
    println!(
        "  Corner exit hysteresis: {} frames",
        settings.analysis.min_corner_frames
    );
    println!("  Throttle: {}", settings.analysis.throttle_threshold);
    println!(
        "  Trail braking steering: {} deg",
        settings.analysis.trail_steering_threshold_deg
    );

    println!("\nComparison:");
    println!("  Distance tolerance: {}", settings.comparison.distance_tolerance);

    println!("\nUpload:");
    println!("  Enabled: {}", settings.upload.enabled);
    println!("  Output dir: {}", settings.upload.output_dir.display());

    println!();
}
