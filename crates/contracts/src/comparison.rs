//! Lap comparison results - Comparison Engine output
//!
//! Deltas are candidate minus baseline, present only for matched pairs.
//! Unmatched entries on either side are reported, never dropped.

use serde::{Deserialize, Serialize};

/// Trail-braking usage across the two laps in a matched zone pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailBrakingComparison {
    Both,
    BaselineOnly,
    CandidateOnly,
    Neither,
}

impl TrailBrakingComparison {
    pub fn from_flags(baseline_has: bool, candidate_has: bool) -> Self {
        match (baseline_has, candidate_has) {
            (true, true) => Self::Both,
            (true, false) => Self::BaselineOnly,
            (false, true) => Self::CandidateOnly,
            (false, false) => Self::Neither,
        }
    }
}

/// Comparison of one baseline braking zone against its nearest candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneComparison {
    /// Index into the baseline lap's zone list
    pub zone_index: usize,

    /// Index of the matched candidate zone, if one was within tolerance
    pub matched_index: Option<usize>,

    /// Baseline zone start distance
    pub baseline_distance: f64,

    /// Matched candidate zone start distance
    pub candidate_distance: Option<f64>,

    pub start_distance_delta: Option<f64>,
    pub entry_speed_delta: Option<f64>,
    pub min_speed_delta: Option<f64>,
    pub max_brake_pressure_delta: Option<f64>,
    pub braking_duration_delta: Option<f64>,
    pub braking_efficiency_delta: Option<f64>,
    pub trail_braking: Option<TrailBrakingComparison>,
}

/// Comparison of one baseline corner against its nearest candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornerComparison {
    /// Index into the baseline lap's corner list
    pub corner_index: usize,

    /// Index of the matched candidate corner, if one was within tolerance
    pub matched_index: Option<usize>,

    /// Baseline corner entry distance
    pub baseline_distance: f64,

    /// Matched candidate corner entry distance
    pub candidate_distance: Option<f64>,

    pub entry_distance_delta: Option<f64>,
    pub entry_speed_delta: Option<f64>,
    pub apex_speed_delta: Option<f64>,
    pub exit_speed_delta: Option<f64>,
    pub max_lateral_g_delta: Option<f64>,
    pub time_in_corner_delta: Option<f64>,
}

/// Scalar roll-up of a lap comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub baseline_lap_number: i32,
    pub candidate_lap_number: i32,

    pub baseline_lap_time: Option<f64>,
    pub candidate_lap_time: Option<f64>,
    pub lap_time_delta: Option<f64>,

    pub max_speed_delta: f64,
    pub average_corner_speed_delta: f64,

    pub total_braking_zones_baseline: usize,
    pub total_braking_zones_candidate: usize,
    pub total_corners_baseline: usize,
    pub total_corners_candidate: usize,

    pub matched_braking_zones: usize,
    pub matched_corners: usize,
}

/// Full result of comparing two laps' metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub summary: ComparisonSummary,
    pub braking_zones: Vec<ZoneComparison>,
    pub corners: Vec<CornerComparison>,

    /// Candidate zone indices no baseline zone matched
    pub unmatched_candidate_zones: Vec<usize>,

    /// Candidate corner indices no baseline corner matched
    pub unmatched_candidate_corners: Vec<usize>,
}
