//! TelemetryFrame - Frame Source output
//!
//! One sample of vehicle telemetry, emitted at the source's native rate
//! (nominally 60 Hz). Never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surface the car is currently on, as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSurface {
    OnTrack,
    OffTrack,
    PitStall,
    ApproachingPits,
    NotInWorld,
}

impl TrackSurface {
    /// True only when the car is on the racing surface.
    #[inline]
    pub fn is_on_track(self) -> bool {
        self == TrackSurface::OnTrack
    }
}

/// Single telemetry sample.
///
/// `lap_distance_pct` is the position around the track in [0, 1), 0.0 at
/// the start/finish line. `steering_angle` is in signed degrees, negative
/// to the left. Accelerations are in g.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Wall-clock capture time
    pub timestamp: DateTime<Utc>,

    /// Simulator session time (seconds) - primary clock
    pub session_time: f64,

    /// Current lap counter from the simulator
    pub lap_number: i32,

    /// Position around the track, [0, 1)
    pub lap_distance_pct: f64,

    /// Speed (m/s)
    pub speed: f64,

    /// Throttle input, [0, 1]
    pub throttle: f64,

    /// Brake input, [0, 1]
    pub brake: f64,

    /// Steering angle (degrees, negative = left)
    pub steering_angle: f64,

    /// Lateral acceleration (g)
    pub lateral_acceleration: f64,

    /// Longitudinal acceleration (g)
    pub longitudinal_acceleration: f64,

    /// Surface under the car
    pub track_surface: TrackSurface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_on_track() {
        assert!(TrackSurface::OnTrack.is_on_track());
        assert!(!TrackSurface::OffTrack.is_on_track());
        assert!(!TrackSurface::PitStall.is_on_track());
        assert!(!TrackSurface::ApproachingPits.is_on_track());
    }

    #[test]
    fn test_frame_serde_round_trip() {
        let frame = TelemetryFrame {
            timestamp: Utc::now(),
            session_time: 12.5,
            lap_number: 3,
            lap_distance_pct: 0.42,
            speed: 51.3,
            throttle: 0.8,
            brake: 0.0,
            steering_angle: -4.2,
            lateral_acceleration: 1.1,
            longitudinal_acceleration: -0.2,
            track_surface: TrackSurface::OnTrack,
        };

        let json = serde_json::to_string(&frame).unwrap();
        let parsed: TelemetryFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.lap_number, 3);
        assert_eq!(parsed.track_surface, TrackSurface::OnTrack);
        assert!((parsed.lap_distance_pct - 0.42).abs() < 1e-12);
    }
}
