//! `compare` command implementation.
//!
//! The synchronous entry point to the comparison engine: loads two
//! previously extracted LapMetrics files and prints the deltas.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use analysis::{compare, CompareConfig};
use contracts::{ComparisonResult, LapMetrics};

use crate::cli::CompareArgs;

/// Execute the `compare` command
pub fn run_compare(args: &CompareArgs) -> Result<()> {
    info!(
        baseline = %args.baseline.display(),
        candidate = %args.candidate.display(),
        "Comparing laps"
    );

    let baseline = load_metrics(&args.baseline)?;
    let candidate = load_metrics(&args.candidate)?;

    let config = CompareConfig {
        distance_tolerance: args.tolerance,
    };
    let result = compare(&baseline, &candidate, &config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize comparison")?;
        println!("{}", json);
    } else {
        print_comparison(&result);
    }

    Ok(())
}

fn load_metrics(path: &Path) -> Result<LapMetrics> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open metrics file {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse lap metrics from {}", path.display()))
}

fn print_comparison(result: &ComparisonResult) {
    let summary = &result.summary;

    println!("\n=== Lap Comparison ===");
    println!(
        "Baseline lap {} vs candidate lap {}",
        summary.baseline_lap_number, summary.candidate_lap_number
    );
    match summary.lap_time_delta {
        Some(delta) => println!("Lap time delta: {delta:+.3}s"),
        None => println!("Lap time delta: N/A"),
    }
    println!("Max speed delta: {:+.2} m/s", summary.max_speed_delta);
    println!(
        "Avg corner speed delta: {:+.2} m/s",
        summary.average_corner_speed_delta
    );
    println!(
        "Braking zones matched: {}/{} (candidate has {})",
        summary.matched_braking_zones,
        summary.total_braking_zones_baseline,
        summary.total_braking_zones_candidate
    );
    println!(
        "Corners matched: {}/{} (candidate has {})",
        summary.matched_corners, summary.total_corners_baseline, summary.total_corners_candidate
    );

    if !result.braking_zones.is_empty() {
        println!("\nBraking zones:");
        for zone in &result.braking_zones {
            match (zone.matched_index, zone.entry_speed_delta, zone.min_speed_delta) {
                (Some(matched), Some(entry), Some(min)) => println!(
                    "  #{} @ {:.3} -> #{}: entry speed {:+.2}, min speed {:+.2}",
                    zone.zone_index, zone.baseline_distance, matched, entry, min
                ),
                _ => println!(
                    "  #{} @ {:.3} -> no match in candidate",
                    zone.zone_index, zone.baseline_distance
                ),
            }
        }
    }

    if !result.corners.is_empty() {
        println!("\nCorners:");
        for corner in &result.corners {
            match (corner.matched_index, corner.apex_speed_delta) {
                (Some(matched), Some(apex)) => println!(
                    "  #{} @ {:.3} -> #{}: apex speed {:+.2}",
                    corner.corner_index, corner.baseline_distance, matched, apex
                ),
                _ => println!(
                    "  #{} @ {:.3} -> no match in candidate",
                    corner.corner_index, corner.baseline_distance
                ),
            }
        }
    }

    if !result.unmatched_candidate_zones.is_empty() {
        println!(
            "\nCandidate-only braking zones: {:?}",
            result.unmatched_candidate_zones
        );
    }
    if !result.unmatched_candidate_corners.is_empty() {
        println!(
            "Candidate-only corners: {:?}",
            result.unmatched_candidate_corners
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_metrics_round_trip() {
        let metrics = LapMetrics {
            lap_number: 3,
            lap_time: Some(88.5),
            braking_zones: vec![],
            corners: vec![],
            max_speed: 71.0,
            min_speed: 33.0,
            average_corner_speed: 0.0,
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&metrics).unwrap()).unwrap();

        let loaded = load_metrics(file.path()).unwrap();
        assert_eq!(loaded.lap_number, 3);
        assert_eq!(loaded.lap_time, Some(88.5));
    }

    #[test]
    fn test_load_metrics_missing_file() {
        assert!(load_metrics(Path::new("/nonexistent/metrics.json")).is_err());
    }
}
