//! Synthetic frame source
//!
//! Deterministic generated circuit for tests and demo runs without a
//! simulator. The track profile is a fixed piecewise layout of straights,
//! braking zones, and corners over lap distance.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use contracts::{FrameSource, SourceError, TelemetryFrame, TrackSurface};

/// One corner of the synthetic circuit and the braking zone ahead of it.
struct Segment {
    brake_from: f64,
    corner_from: f64,
    corner_to: f64,
    /// Steering at the corner's heart (degrees, signed)
    steering: f64,
    /// Speed carried through the corner (m/s)
    corner_speed: f64,
}

/// Fixed three-corner layout used for every synthetic lap.
const SEGMENTS: [Segment; 3] = [
    Segment {
        brake_from: 0.10,
        corner_from: 0.15,
        corner_to: 0.22,
        steering: 14.0,
        corner_speed: 36.0,
    },
    Segment {
        brake_from: 0.38,
        corner_from: 0.43,
        corner_to: 0.50,
        steering: -12.0,
        corner_speed: 40.0,
    },
    Segment {
        brake_from: 0.68,
        corner_from: 0.73,
        corner_to: 0.81,
        steering: 10.0,
        corner_speed: 44.0,
    },
];

/// Straight-line speed of the synthetic car (m/s).
const STRAIGHT_SPEED: f64 = 72.0;

/// Synthetic source configuration.
#[derive(Debug, Clone)]
pub struct SyntheticSourceConfig {
    /// Sample rate (Hz)
    pub frequency_hz: f64,

    /// Number of laps to generate before end-of-stream
    pub laps: u32,

    /// Nominal lap duration (seconds); sets frames per lap
    pub lap_seconds: f64,

    /// Sleep between frames to emulate a live source
    pub realtime: bool,
}

impl Default for SyntheticSourceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 60.0,
            laps: 3,
            lap_seconds: 90.0,
            realtime: false,
        }
    }
}

/// Deterministic telemetry generator.
///
/// Identical configuration always yields the identical frame stream.
pub struct SyntheticFrameSource {
    config: SyntheticSourceConfig,
    frames_per_lap: u64,
    emitted: u64,
    connected: bool,
}

impl SyntheticFrameSource {
    pub fn new(config: SyntheticSourceConfig) -> Self {
        let frames_per_lap = (config.frequency_hz * config.lap_seconds).max(1.0) as u64;
        Self {
            config,
            frames_per_lap,
            emitted: 0,
            connected: false,
        }
    }

    fn total_frames(&self) -> u64 {
        self.frames_per_lap * u64::from(self.config.laps)
    }

    /// Build the frame at the current cursor.
    fn frame_at(&self, index: u64) -> TelemetryFrame {
        let lap_number = (index / self.frames_per_lap) as i32 + 1;
        let lap_distance_pct = (index % self.frames_per_lap) as f64 / self.frames_per_lap as f64;
        let session_time = index as f64 / self.config.frequency_hz;

        let (speed, throttle, brake, steering_angle, lateral_acceleration) =
            sample_profile(lap_distance_pct);

        TelemetryFrame {
            timestamp: Utc::now(),
            session_time,
            lap_number,
            lap_distance_pct,
            speed,
            throttle,
            brake,
            steering_angle,
            lateral_acceleration,
            longitudinal_acceleration: if brake > 0.0 { -1.1 } else { 0.2 },
            track_surface: TrackSurface::OnTrack,
        }
    }
}

/// Car state at a lap distance: (speed, throttle, brake, steering, lateral g).
fn sample_profile(d: f64) -> (f64, f64, f64, f64, f64) {
    for segment in &SEGMENTS {
        // Braking zone: speed ramps down toward the corner speed.
        if d >= segment.brake_from && d < segment.corner_from {
            let progress = (d - segment.brake_from) / (segment.corner_from - segment.brake_from);
            let speed = STRAIGHT_SPEED - (STRAIGHT_SPEED - segment.corner_speed) * progress;
            // Light trail steering toward the end of the zone
            let steering = segment.steering * 0.3 * progress;
            return (speed, 0.0, 0.8, steering, 0.4 * progress);
        }

        // Corner: steady steering, apex load mid-corner.
        if d >= segment.corner_from && d < segment.corner_to {
            let span = segment.corner_to - segment.corner_from;
            let progress = (d - segment.corner_from) / span;
            // Peak lateral load at mid-corner
            let load = 1.0 - (2.0 * progress - 1.0).abs();
            let lateral = segment.steering.signum() * (1.2 + 1.4 * load);
            let throttle = if progress > 0.5 { 0.4 + 0.6 * (progress - 0.5) * 2.0 } else { 0.0 };
            return (
                segment.corner_speed + 4.0 * (progress - 0.5).abs(),
                throttle,
                0.0,
                segment.steering,
                lateral,
            );
        }
    }

    // Straight
    (STRAIGHT_SPEED, 0.95, 0.0, 0.0, 0.05)
}

impl FrameSource for SyntheticFrameSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn start(&mut self) -> Result<(), SourceError> {
        debug!(
            frequency_hz = self.config.frequency_hz,
            laps = self.config.laps,
            frames_per_lap = self.frames_per_lap,
            "synthetic source started"
        );
        self.emitted = 0;
        self.connected = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected && self.emitted < self.total_frames()
    }

    async fn next_frame(&mut self) -> Option<TelemetryFrame> {
        if !self.connected || self.emitted >= self.total_frames() {
            return None;
        }

        let frame = self.frame_at(self.emitted);
        self.emitted += 1;

        if self.config.realtime {
            tokio::time::sleep(Duration::from_secs_f64(1.0 / self.config.frequency_hz)).await;
        }

        Some(frame)
    }
}
