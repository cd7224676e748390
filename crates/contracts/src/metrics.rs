//! Per-lap performance metrics - Metrics Extractor output
//!
//! Distances are lap-distance percentages in [0, 1); spans that cross the
//! start/finish line are already wrap-corrected by the extractor.

use serde::{Deserialize, Serialize};

/// One contiguous braking zone.
///
/// Invariants: `min_speed <= entry_speed`; `max_brake_pressure` exceeds the
/// detection threshold that opened the zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrakingZone {
    /// Lap distance where brake input first exceeded the threshold
    pub start_distance: f64,

    /// Lap distance of the last frame inside the zone
    pub end_distance: f64,

    /// Speed at zone entry (m/s)
    pub entry_speed: f64,

    /// Minimum speed inside the zone (m/s)
    pub min_speed: f64,

    /// Peak brake input inside the zone, [0, 1]
    pub max_brake_pressure: f64,

    /// Session-time span of the zone (seconds)
    pub braking_duration: f64,

    /// Deceleration over the opening window (m/s^2, negative when slowing)
    pub initial_deceleration: f64,

    /// Deceleration from entry speed to minimum speed over the full zone
    pub average_deceleration: f64,

    /// average / initial deceleration, clamped to [0, 1].
    ///
    /// Reads as "how much of the opening bite was sustained": 1.0 means the
    /// zone decelerated as hard on average as it did initially.
    /// TODO: confirm this ratio with the race-engineering reviewers; a
    /// load-transfer-aware formula may replace it.
    pub braking_efficiency: f64,

    /// Brake and meaningful steering overlapped inside the zone
    pub has_trail_braking: bool,

    /// Wrap-corrected distance covered while trail braking
    pub trail_brake_distance: Option<f64>,

    /// Mean brake input over the trail-braking frames
    pub trail_brake_pressure: Option<f64>,
}

/// One detected corner.
///
/// Invariant: entry <= apex <= exit in wrap-aware lap-distance order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corner {
    /// Lap distance where |steering| first exceeded the threshold
    pub entry_distance: f64,

    /// Lap distance of the maximum-|lateral g| frame
    pub apex_distance: f64,

    /// Lap distance where the corner was confirmed finished
    pub exit_distance: f64,

    /// Speed at entry (m/s)
    pub entry_speed: f64,

    /// Speed at the apex frame (m/s)
    pub apex_speed: f64,

    /// Speed at exit (m/s)
    pub exit_speed: f64,

    /// Minimum speed anywhere inside the corner (m/s)
    pub min_speed: f64,

    /// Peak |lateral acceleration| inside the corner (g)
    pub max_lateral_g: f64,

    /// First post-apex distance where throttle recrossed its threshold
    pub throttle_application_distance: f64,

    /// Steering angle at the apex frame (degrees, signed)
    pub apex_steering_angle: f64,

    /// Direction, from the sign of the apex steering angle
    pub is_left_turn: bool,

    /// Session-time spent between entry and exit (seconds)
    pub time_in_corner: f64,

    /// Wrap-corrected entry-to-exit distance
    pub corner_distance: f64,
}

/// All metrics extracted from one lap.
///
/// Zone and corner lists are ordered by start/entry distance, as produced
/// by the forward scans. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapMetrics {
    pub lap_number: i32,

    /// Lap time when the lap carried one (partial laps may not)
    pub lap_time: Option<f64>,

    pub braking_zones: Vec<BrakingZone>,
    pub corners: Vec<Corner>,

    /// Peak speed anywhere in the lap (m/s)
    pub max_speed: f64,

    /// Minimum speed anywhere in the lap (m/s)
    pub min_speed: f64,

    /// Mean apex speed over all corners, 0.0 when there are none
    pub average_corner_speed: f64,
}

impl LapMetrics {
    pub fn total_braking_zones(&self) -> usize {
        self.braking_zones.len()
    }

    pub fn total_corners(&self) -> usize {
        self.corners.len()
    }
}
