//! Lap - Lap Assembler output
//!
//! A bounded, ordered slice of the frame stream between two lap boundaries.

use serde::{Deserialize, Serialize};

use crate::TelemetryFrame;

/// One assembled lap.
///
/// Frames keep arrival order. `lap_time` and `is_valid` are derived once at
/// construction and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lap {
    /// Lap counter value the frames were recorded under
    pub lap_number: i32,

    /// Frames in arrival order
    pub frames: Vec<TelemetryFrame>,

    /// Session-time span of the lap (seconds)
    pub lap_time: f64,

    /// True iff every frame was on the racing surface
    pub is_valid: bool,
}

impl Lap {
    /// Build a lap from a buffered frame sequence.
    ///
    /// `lap_time` is the session-time delta between the first and last
    /// frame; a single-frame lap has a zero lap time.
    pub fn from_frames(lap_number: i32, frames: Vec<TelemetryFrame>) -> Self {
        let lap_time = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => last.session_time - first.session_time,
            _ => 0.0,
        };
        let is_valid = !frames.is_empty() && frames.iter().all(|f| f.track_surface.is_on_track());

        Self {
            lap_number,
            frames,
            lap_time,
            is_valid,
        }
    }

    /// Number of frames in the lap.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the lap holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackSurface;
    use chrono::Utc;

    fn frame(session_time: f64, surface: TrackSurface) -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc::now(),
            session_time,
            lap_number: 1,
            lap_distance_pct: 0.0,
            speed: 40.0,
            throttle: 0.5,
            brake: 0.0,
            steering_angle: 0.0,
            lateral_acceleration: 0.0,
            longitudinal_acceleration: 0.0,
            track_surface: surface,
        }
    }

    #[test]
    fn test_lap_time_from_session_time() {
        let lap = Lap::from_frames(
            1,
            vec![
                frame(100.0, TrackSurface::OnTrack),
                frame(100.5, TrackSurface::OnTrack),
                frame(101.25, TrackSurface::OnTrack),
            ],
        );
        assert!((lap.lap_time - 1.25).abs() < 1e-12);
        assert!(lap.is_valid);
    }

    #[test]
    fn test_off_track_frame_invalidates_lap() {
        let lap = Lap::from_frames(
            2,
            vec![
                frame(0.0, TrackSurface::OnTrack),
                frame(1.0, TrackSurface::OffTrack),
                frame(2.0, TrackSurface::OnTrack),
            ],
        );
        assert!(!lap.is_valid);
    }

    #[test]
    fn test_empty_lap() {
        let lap = Lap::from_frames(0, vec![]);
        assert!(lap.is_empty());
        assert!(!lap.is_valid);
        assert_eq!(lap.lap_time, 0.0);
    }
}
