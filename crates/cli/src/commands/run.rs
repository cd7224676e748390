//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use contracts::{PipelineSettings, SourceMode};

use crate::cli::{RunArgs, SourceModeArg};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut settings = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut settings, args);

    info!(
        mode = ?settings.source.mode,
        frame_capacity = settings.bus.frame_capacity,
        lifecycle_capacity = settings.bus.lifecycle_capacity,
        upload = settings.upload.enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&settings);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        settings,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    info!("Starting pipeline...");
    let stats = Pipeline::new(pipeline_config)
        .run()
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames = stats.frames_published,
        laps = stats.session.total_laps,
        dropped = stats.bus.dropped,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed successfully"
    );

    stats.print_summary();

    info!("lapcoach finished");
    Ok(())
}

/// Fold CLI overrides into the loaded settings.
fn apply_overrides(settings: &mut PipelineSettings, args: &RunArgs) {
    if let Some(mode) = args.source {
        settings.source.mode = match mode {
            SourceModeArg::Replay => SourceMode::Replay,
            SourceModeArg::Synthetic => SourceMode::Synthetic,
        };
    }
    if let Some(ref path) = args.replay {
        info!(path = %path.display(), "Overriding replay path from CLI");
        settings.source.replay_path = Some(path.clone());
        settings.source.mode = SourceMode::Replay;
    }
    if let Some(speed) = args.replay_speed {
        settings.source.speed_multiplier = speed;
    }
    if let Some(laps) = args.laps {
        settings.source.synthetic_laps = laps;
    }
    if args.upload {
        settings.upload.enabled = true;
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(settings: &PipelineSettings) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Mode: {:?}", settings.source.mode);
    if let Some(ref path) = settings.source.replay_path {
        println!("  Replay file: {}", path.display());
        println!("  Speed: {}x", settings.source.speed_multiplier);
    }
    if settings.source.mode == SourceMode::Synthetic {
        println!("  Frequency: {} Hz", settings.source.frequency_hz);
        println!("  Laps: {}", settings.source.synthetic_laps);
    }

    println!("\nEvent bus:");
    println!("  Lifecycle queue: {}", settings.bus.lifecycle_capacity);
    println!("  Frame queue: {}", settings.bus.frame_capacity);
    println!("  Drain timeout: {} ms", settings.bus.drain_timeout_ms);

    println!("\nLap assembly:");
    println!(
        "  Wrap window: {} -> {}",
        settings.assembler.wrap_high, settings.assembler.wrap_low
    );
    println!(
        "  Partial lap policy: {:?}",
        settings.assembler.partial_lap_policy
    );

    println!("\nAnalysis:");
    println!("  Brake threshold: {}", settings.analysis.brake_threshold);
    println!(
        "  Steering threshold: {} deg",
        settings.analysis.steering_threshold_deg
    );
    println!(
        "  Corner exit hysteresis: {} frames",
        settings.analysis.min_corner_frames
    );

    if settings.upload.enabled {
        println!("\nUpload:");
        println!("  Output dir: {}", settings.upload.output_dir.display());
    }

    println!();
}
