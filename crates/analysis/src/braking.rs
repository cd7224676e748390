//! Braking-zone extraction.
//!
//! Single forward pass over a lap's frames with a two-state machine.

use contracts::{AnalysisConfig, BrakingZone, TelemetryFrame};

use crate::math::wrap_delta;

/// Running accumulator for one open braking zone.
struct ZoneBuilder {
    start_idx: usize,
    start_distance: f64,
    entry_speed: f64,
    start_time: f64,
    max_pressure: f64,
    min_speed: f64,
    end_idx: usize,
}

impl ZoneBuilder {
    fn open(idx: usize, frame: &TelemetryFrame) -> Self {
        Self {
            start_idx: idx,
            start_distance: frame.lap_distance_pct,
            entry_speed: frame.speed,
            start_time: frame.session_time,
            max_pressure: frame.brake,
            min_speed: frame.speed,
            end_idx: idx,
        }
    }

    fn update(&mut self, idx: usize, frame: &TelemetryFrame) {
        self.max_pressure = self.max_pressure.max(frame.brake);
        self.min_speed = self.min_speed.min(frame.speed);
        self.end_idx = idx;
    }
}

struct TrailInfo {
    has_trail_braking: bool,
    distance: Option<f64>,
    mean_pressure: Option<f64>,
}

/// Extract all braking zones from a lap's frames.
///
/// Deterministic single pass: enter a zone when brake exceeds the
/// threshold, track running extrema while inside, close it when brake
/// falls back to or below the threshold. A zone still open at the end of
/// the frame slice is finalized there.
pub fn extract_braking_zones(
    frames: &[TelemetryFrame],
    config: &AnalysisConfig,
) -> Vec<BrakingZone> {
    let mut zones = Vec::new();
    let mut builder: Option<ZoneBuilder> = None;

    for (idx, frame) in frames.iter().enumerate() {
        let braking = frame.brake > config.brake_threshold;
        if braking {
            if let Some(open) = builder.as_mut() {
                open.update(idx, frame);
            } else {
                builder = Some(ZoneBuilder::open(idx, frame));
            }
        } else if let Some(done) = builder.take() {
            zones.push(finalize_zone(done, frames, config));
        }
    }

    if let Some(done) = builder.take() {
        zones.push(finalize_zone(done, frames, config));
    }

    zones
}

fn finalize_zone(
    builder: ZoneBuilder,
    frames: &[TelemetryFrame],
    config: &AnalysisConfig,
) -> BrakingZone {
    let end_frame = &frames[builder.end_idx];
    let duration = end_frame.session_time - builder.start_time;

    let initial_window_end = (builder.start_idx + config.decel_window).min(builder.end_idx);
    let initial_deceleration = deceleration_over(frames, builder.start_idx, initial_window_end);

    let average_deceleration = if duration > 0.0 {
        (builder.min_speed - builder.entry_speed) / duration
    } else {
        0.0
    };

    let trail = detect_trail_braking(frames, builder.start_idx, builder.end_idx, config);

    BrakingZone {
        start_distance: builder.start_distance,
        end_distance: end_frame.lap_distance_pct,
        entry_speed: builder.entry_speed,
        min_speed: builder.min_speed,
        max_brake_pressure: builder.max_pressure,
        braking_duration: duration,
        initial_deceleration,
        average_deceleration,
        braking_efficiency: braking_efficiency(average_deceleration, initial_deceleration),
        has_trail_braking: trail.has_trail_braking,
        trail_brake_distance: trail.distance,
        trail_brake_pressure: trail.mean_pressure,
    }
}

/// Speed change per unit time between two frame indices (m/s^2).
///
/// Negative while slowing. Zero for degenerate ranges.
fn deceleration_over(frames: &[TelemetryFrame], start_idx: usize, end_idx: usize) -> f64 {
    if start_idx >= end_idx || end_idx >= frames.len() {
        return 0.0;
    }
    let start = &frames[start_idx];
    let end = &frames[end_idx];
    let dt = end.session_time - start.session_time;
    if dt <= 0.0 {
        return 0.0;
    }
    (end.speed - start.speed) / dt
}

/// Sustained-deceleration ratio: average over initial, clamped to [0, 1].
///
/// Zero when the opening window shows no deceleration at all.
fn braking_efficiency(average: f64, initial: f64) -> f64 {
    if initial >= -f64::EPSILON {
        return 0.0;
    }
    (average / initial).clamp(0.0, 1.0)
}

/// Look for brake input co-occurring with meaningful steering inside the
/// zone. Distance accumulates wrap-aware across the start/finish line.
fn detect_trail_braking(
    frames: &[TelemetryFrame],
    start_idx: usize,
    end_idx: usize,
    config: &AnalysisConfig,
) -> TrailInfo {
    let mut distance = 0.0;
    let mut pressure_sum = 0.0;
    let mut trail_frames = 0u32;

    for idx in start_idx..=end_idx.min(frames.len() - 1) {
        let frame = &frames[idx];
        if frame.brake > config.brake_threshold
            && frame.steering_angle.abs() > config.trail_steering_threshold
        {
            trail_frames += 1;
            pressure_sum += frame.brake;
            if let Some(next) = frames.get(idx + 1) {
                distance += wrap_delta(next.lap_distance_pct - frame.lap_distance_pct);
            }
        }
    }

    if trail_frames == 0 {
        TrailInfo {
            has_trail_braking: false,
            distance: None,
            mean_pressure: None,
        }
    } else {
        TrailInfo {
            has_trail_braking: true,
            distance: Some(distance),
            mean_pressure: Some(pressure_sum / f64::from(trail_frames)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::TrackSurface;

    fn frame(brake: f64, speed: f64, distance: f64, session_time: f64) -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc::now(),
            session_time,
            lap_number: 1,
            lap_distance_pct: distance,
            speed,
            throttle: 0.0,
            brake,
            steering_angle: 0.0,
            lateral_acceleration: 0.0,
            longitudinal_acceleration: 0.0,
            track_surface: TrackSurface::OnTrack,
        }
    }

    fn steering_frame(
        brake: f64,
        steering: f64,
        speed: f64,
        distance: f64,
        session_time: f64,
    ) -> TelemetryFrame {
        TelemetryFrame {
            steering_angle: steering,
            ..frame(brake, speed, distance, session_time)
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn test_no_braking() {
        let frames = vec![
            frame(0.0, 50.0, 0.0, 0.0),
            frame(0.0, 50.0, 0.1, 1.0),
            frame(0.0, 50.0, 0.2, 2.0),
        ];
        assert!(extract_braking_zones(&frames, &config()).is_empty());
    }

    #[test]
    fn test_single_zone() {
        let frames = vec![
            frame(0.0, 80.0, 0.40, 0.0),
            frame(0.8, 75.0, 0.45, 0.5),
            frame(0.9, 60.0, 0.50, 1.0),
            frame(0.6, 45.0, 0.55, 1.5),
            frame(0.0, 40.0, 0.60, 2.0),
            frame(0.0, 45.0, 0.65, 2.5),
        ];

        let zones = extract_braking_zones(&frames, &config());
        assert_eq!(zones.len(), 1);

        let zone = &zones[0];
        assert_eq!(zone.start_distance, 0.45);
        assert_eq!(zone.entry_speed, 75.0);
        assert_eq!(zone.end_distance, 0.55);
        assert_eq!(zone.max_brake_pressure, 0.9);
        assert_eq!(zone.min_speed, 45.0);
        assert!((zone.braking_duration - 1.0).abs() < 1e-10);
        // Average: (45 - 75) / 1.0 = -30 m/s^2
        assert!((zone.average_deceleration + 30.0).abs() < 1e-10);
        assert!(!zone.has_trail_braking);
    }

    #[test]
    fn test_invariants_hold() {
        let frames = vec![
            frame(0.0, 80.0, 0.1, 0.0),
            frame(0.7, 70.0, 0.2, 1.0),
            frame(0.9, 55.0, 0.3, 2.0),
            frame(0.2, 65.0, 0.4, 3.0),
            frame(0.0, 70.0, 0.5, 4.0),
        ];

        let zones = extract_braking_zones(&frames, &config());
        for zone in &zones {
            assert!(zone.min_speed <= zone.entry_speed);
            assert!(zone.max_brake_pressure > config().brake_threshold);
        }
    }

    #[test]
    fn test_multiple_zones() {
        let frames = vec![
            frame(0.0, 80.0, 0.0, 0.0),
            frame(0.8, 60.0, 0.1, 1.0),
            frame(0.0, 50.0, 0.2, 2.0),
            frame(0.0, 70.0, 0.5, 3.0),
            frame(0.7, 55.0, 0.6, 4.0),
            frame(0.0, 45.0, 0.7, 5.0),
        ];
        assert_eq!(extract_braking_zones(&frames, &config()).len(), 2);
    }

    #[test]
    fn test_zone_open_at_end_of_lap() {
        let frames = vec![
            frame(0.0, 80.0, 0.90, 0.0),
            frame(0.8, 60.0, 0.95, 1.0),
            frame(0.9, 50.0, 0.99, 2.0),
        ];
        let zones = extract_braking_zones(&frames, &config());
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].end_distance, 0.99);
    }

    #[test]
    fn test_efficiency_clamped() {
        // Hard initial bite, long soft tail: average is well below initial.
        let frames = vec![
            frame(0.9, 80.0, 0.10, 0.0),
            frame(0.9, 60.0, 0.11, 0.2),
            frame(0.3, 58.0, 0.12, 0.4),
            frame(0.3, 56.0, 0.13, 0.6),
            frame(0.3, 54.0, 0.14, 0.8),
            frame(0.3, 52.0, 0.15, 1.0),
            frame(0.3, 50.0, 0.16, 3.0),
            frame(0.0, 50.0, 0.17, 3.2),
        ];
        let zones = extract_braking_zones(&frames, &config());
        assert_eq!(zones.len(), 1);
        let eff = zones[0].braking_efficiency;
        assert!((0.0..=1.0).contains(&eff));
        assert!(eff < 1.0);
    }

    #[test]
    fn test_trail_braking_detected() {
        let cfg = config();
        let frames = vec![
            steering_frame(0.0, 0.0, 80.0, 0.10, 0.0),
            steering_frame(0.8, 0.0, 70.0, 0.12, 0.2),
            steering_frame(0.6, 8.0, 60.0, 0.14, 0.4),
            steering_frame(0.4, 12.0, 55.0, 0.16, 0.6),
            steering_frame(0.0, 14.0, 52.0, 0.18, 0.8),
        ];
        let zones = extract_braking_zones(&frames, &cfg);
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert!(zone.has_trail_braking);
        // Two trailing frames at 0.6 and 0.4 brake
        let mean = zone.trail_brake_pressure.unwrap();
        assert!((mean - 0.5).abs() < 1e-10);
        let dist = zone.trail_brake_distance.unwrap();
        assert!(dist > 0.0);
    }

    #[test]
    fn test_trail_distance_across_wrap() {
        let cfg = config();
        let frames = vec![
            steering_frame(0.8, 10.0, 70.0, 0.98, 0.0),
            steering_frame(0.8, 10.0, 65.0, 0.99, 0.2),
            steering_frame(0.8, 10.0, 60.0, 0.01, 0.4),
            steering_frame(0.0, 0.0, 58.0, 0.03, 0.6),
        ];
        let zones = extract_braking_zones(&frames, &cfg);
        assert_eq!(zones.len(), 1);
        let dist = zones[0].trail_brake_distance.unwrap();
        // 0.98 -> 0.03 the short way around is 0.05
        assert!((dist - 0.05).abs() < 1e-10);
    }

    #[test]
    fn test_idempotent_on_identical_input() {
        let frames = vec![
            frame(0.0, 80.0, 0.40, 0.0),
            frame(0.8, 75.0, 0.45, 0.5),
            frame(0.0, 40.0, 0.60, 2.0),
        ];
        let first = extract_braking_zones(&frames, &config());
        let second = extract_braking_zones(&frames, &config());
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].start_distance, second[0].start_distance);
        assert_eq!(first[0].braking_efficiency, second[0].braking_efficiency);
    }

    #[test]
    fn test_empty_frames() {
        let frames: Vec<TelemetryFrame> = vec![];
        assert!(extract_braking_zones(&frames, &config()).is_empty());
    }
}
