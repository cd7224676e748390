//! Lap comparison engine.
//!
//! Synchronous pure function: aligns two LapMetrics by start/entry
//! distance and computes per-pair deltas plus a scalar summary. Invoked by
//! an external request layer, not via the bus.

use contracts::{
    ComparisonResult, ComparisonSummary, CornerComparison, LapMetrics, TrailBrakingComparison,
    ZoneComparison,
};

use crate::math::wrap_separation;

/// Comparison tuning.
#[derive(Debug, Clone, Copy)]
pub struct CompareConfig {
    /// Maximum wrap-aware start/entry distance separation for a match
    pub distance_tolerance: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: 0.10,
        }
    }
}

/// Compare a candidate lap against a baseline lap.
///
/// For zones and corners independently: each baseline entry greedily takes
/// the nearest unused candidate entry within tolerance (ties to the lowest
/// candidate index). Deltas are candidate minus baseline and exist only
/// for matched pairs; unmatched entries on both sides are reported.
pub fn compare(
    baseline: &LapMetrics,
    candidate: &LapMetrics,
    config: &CompareConfig,
) -> ComparisonResult {
    let zone_keys_baseline: Vec<f64> = baseline.braking_zones.iter().map(|z| z.start_distance).collect();
    let zone_keys_candidate: Vec<f64> = candidate.braking_zones.iter().map(|z| z.start_distance).collect();
    let zone_matches = greedy_match(&zone_keys_baseline, &zone_keys_candidate, config.distance_tolerance);

    let corner_keys_baseline: Vec<f64> = baseline.corners.iter().map(|c| c.entry_distance).collect();
    let corner_keys_candidate: Vec<f64> = candidate.corners.iter().map(|c| c.entry_distance).collect();
    let corner_matches = greedy_match(
        &corner_keys_baseline,
        &corner_keys_candidate,
        config.distance_tolerance,
    );

    let braking_zones: Vec<ZoneComparison> = baseline
        .braking_zones
        .iter()
        .enumerate()
        .map(|(idx, zone)| match zone_matches[idx] {
            Some(matched) => {
                let other = &candidate.braking_zones[matched];
                ZoneComparison {
                    zone_index: idx,
                    matched_index: Some(matched),
                    baseline_distance: zone.start_distance,
                    candidate_distance: Some(other.start_distance),
                    start_distance_delta: Some(other.start_distance - zone.start_distance),
                    entry_speed_delta: Some(other.entry_speed - zone.entry_speed),
                    min_speed_delta: Some(other.min_speed - zone.min_speed),
                    max_brake_pressure_delta: Some(
                        other.max_brake_pressure - zone.max_brake_pressure,
                    ),
                    braking_duration_delta: Some(other.braking_duration - zone.braking_duration),
                    braking_efficiency_delta: Some(
                        other.braking_efficiency - zone.braking_efficiency,
                    ),
                    trail_braking: Some(TrailBrakingComparison::from_flags(
                        zone.has_trail_braking,
                        other.has_trail_braking,
                    )),
                }
            }
            None => ZoneComparison {
                zone_index: idx,
                matched_index: None,
                baseline_distance: zone.start_distance,
                candidate_distance: None,
                start_distance_delta: None,
                entry_speed_delta: None,
                min_speed_delta: None,
                max_brake_pressure_delta: None,
                braking_duration_delta: None,
                braking_efficiency_delta: None,
                trail_braking: None,
            },
        })
        .collect();

    let corners: Vec<CornerComparison> = baseline
        .corners
        .iter()
        .enumerate()
        .map(|(idx, corner)| match corner_matches[idx] {
            Some(matched) => {
                let other = &candidate.corners[matched];
                CornerComparison {
                    corner_index: idx,
                    matched_index: Some(matched),
                    baseline_distance: corner.entry_distance,
                    candidate_distance: Some(other.entry_distance),
                    entry_distance_delta: Some(other.entry_distance - corner.entry_distance),
                    entry_speed_delta: Some(other.entry_speed - corner.entry_speed),
                    apex_speed_delta: Some(other.apex_speed - corner.apex_speed),
                    exit_speed_delta: Some(other.exit_speed - corner.exit_speed),
                    max_lateral_g_delta: Some(other.max_lateral_g - corner.max_lateral_g),
                    time_in_corner_delta: Some(other.time_in_corner - corner.time_in_corner),
                }
            }
            None => CornerComparison {
                corner_index: idx,
                matched_index: None,
                baseline_distance: corner.entry_distance,
                candidate_distance: None,
                entry_distance_delta: None,
                entry_speed_delta: None,
                apex_speed_delta: None,
                exit_speed_delta: None,
                max_lateral_g_delta: None,
                time_in_corner_delta: None,
            },
        })
        .collect();

    let unmatched_candidate_zones = unmatched_indices(zone_keys_candidate.len(), &zone_matches);
    let unmatched_candidate_corners =
        unmatched_indices(corner_keys_candidate.len(), &corner_matches);

    let matched_braking_zones = braking_zones.iter().filter(|z| z.matched_index.is_some()).count();
    let matched_corners = corners.iter().filter(|c| c.matched_index.is_some()).count();

    let lap_time_delta = match (baseline.lap_time, candidate.lap_time) {
        (Some(b), Some(c)) => Some(c - b),
        _ => None,
    };

    ComparisonResult {
        summary: ComparisonSummary {
            baseline_lap_number: baseline.lap_number,
            candidate_lap_number: candidate.lap_number,
            baseline_lap_time: baseline.lap_time,
            candidate_lap_time: candidate.lap_time,
            lap_time_delta,
            max_speed_delta: candidate.max_speed - baseline.max_speed,
            average_corner_speed_delta: candidate.average_corner_speed
                - baseline.average_corner_speed,
            total_braking_zones_baseline: baseline.braking_zones.len(),
            total_braking_zones_candidate: candidate.braking_zones.len(),
            total_corners_baseline: baseline.corners.len(),
            total_corners_candidate: candidate.corners.len(),
            matched_braking_zones,
            matched_corners,
        },
        braking_zones,
        corners,
        unmatched_candidate_zones,
        unmatched_candidate_corners,
    }
}

/// For each baseline key, the index of the nearest unused candidate key
/// within tolerance. Wrap-aware; ties break to the lowest candidate index.
fn greedy_match(baseline: &[f64], candidates: &[f64], tolerance: f64) -> Vec<Option<usize>> {
    let mut used = vec![false; candidates.len()];
    baseline
        .iter()
        .map(|&key| {
            let mut best: Option<(usize, f64)> = None;
            for (idx, &other) in candidates.iter().enumerate() {
                if used[idx] {
                    continue;
                }
                let separation = wrap_separation(key, other);
                if separation >= tolerance {
                    continue;
                }
                // Strict less-than keeps the lowest index on equal separation.
                if best.map_or(true, |(_, best_sep)| separation < best_sep) {
                    best = Some((idx, separation));
                }
            }
            best.map(|(idx, _)| {
                used[idx] = true;
                idx
            })
        })
        .collect()
}

fn unmatched_indices(candidate_len: usize, matches: &[Option<usize>]) -> Vec<usize> {
    let mut taken = vec![false; candidate_len];
    for matched in matches.iter().flatten() {
        taken[*matched] = true;
    }
    taken
        .iter()
        .enumerate()
        .filter_map(|(idx, &t)| (!t).then_some(idx))
        .collect()
}
